// src/logger/classify.rs

/// Coarse executable category, used only for presentation: the `[type]` tag
/// and icon on each log line. Never persisted as a standalone field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Node,
    Npm,
    Python,
    Cargo,
    Go,
    Docker,
    Make,
    Shell,
    Other,
}

impl CommandType {
    /// Classify by executable basename.
    pub fn from_executable(executable: &str) -> Self {
        let base = basename(executable);
        match base.as_str() {
            "node" | "nodejs" => CommandType::Node,
            "npm" | "npx" | "yarn" | "pnpm" => CommandType::Npm,
            "cargo" | "rustc" => CommandType::Cargo,
            "go" => CommandType::Go,
            "docker" | "docker-compose" | "podman" => CommandType::Docker,
            "make" => CommandType::Make,
            "sh" | "bash" | "zsh" | "fish" | "dash" => CommandType::Shell,
            s if s.starts_with("python") || s == "pip" || s == "pip3" => CommandType::Python,
            _ => CommandType::Other,
        }
    }

    /// Short tag for the `[type]` column.
    pub fn tag(&self) -> &'static str {
        match self {
            CommandType::Node => "node",
            CommandType::Npm => "npm",
            CommandType::Python => "python",
            CommandType::Cargo => "cargo",
            CommandType::Go => "go",
            CommandType::Docker => "docker",
            CommandType::Make => "make",
            CommandType::Shell => "shell",
            CommandType::Other => "cmd",
        }
    }

    /// Stdout line icon. Stderr lines use a uniform `!` marker instead.
    pub fn icon(&self) -> &'static str {
        match self {
            CommandType::Node => "⬢",
            CommandType::Npm => "◆",
            CommandType::Python => "≡",
            CommandType::Cargo => "⚙",
            CommandType::Go => "»",
            CommandType::Docker => "◧",
            CommandType::Make => "⚒",
            CommandType::Shell => "$",
            CommandType::Other => "›",
        }
    }
}

/// Final path component, lowercased, `.exe` stripped.
fn basename(executable: &str) -> String {
    let base = executable
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(executable)
        .to_lowercase();
    match base.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => base,
    }
}
