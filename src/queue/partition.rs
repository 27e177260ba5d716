// src/queue/partition.rs

use crate::queue::descriptor::CommandDescriptor;

/// One dispatch unit produced by [`partition`].
///
/// The engine awaits a `Sequential` command alone, and dispatches all members
/// of a `Concurrent` group together, awaiting the group as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    Sequential(CommandDescriptor),
    Concurrent(Vec<CommandDescriptor>),
}

impl Group {
    /// Number of commands in this group.
    pub fn len(&self) -> usize {
        match self {
            Group::Sequential(_) => 1,
            Group::Concurrent(cmds) => cmds.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition an ordered queue into maximal runs, preserving original order.
///
/// A run of consecutive `concurrent = true` commands becomes one `Concurrent`
/// group; every `concurrent = false` command becomes its own `Sequential`
/// group. A lone concurrent command still forms a (single-member) group, which
/// the engine treats identically.
pub fn partition(commands: Vec<CommandDescriptor>) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut pending: Vec<CommandDescriptor> = Vec::new();

    for cmd in commands {
        if cmd.concurrent {
            pending.push(cmd);
        } else {
            if !pending.is_empty() {
                groups.push(Group::Concurrent(std::mem::take(&mut pending)));
            }
            groups.push(Group::Sequential(cmd));
        }
    }

    if !pending.is_empty() {
        groups.push(Group::Concurrent(pending));
    }

    groups
}
