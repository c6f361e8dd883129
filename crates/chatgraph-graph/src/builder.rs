//! Interaction graph construction.
//!
//! Every reply to a known message and every reaction becomes one
//! [`InteractionEvent`]; each event adds exactly one unit of weight to the
//! undirected edge between its two users, so the result does not depend on
//! the order messages are visited in.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::{debug, info};

use chatgraph_types::{InteractionEvent, Message, MessageId, User, UserId};

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfLoopPolicy {
    #[default]
    Skip,
    Keep,
}

/// What to do when an event names a user missing from the member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownUserPolicy {
    #[default]
    Skip,
    /// Create the node on first sight
    AddNode,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub self_loops: SelfLoopPolicy,
    pub unknown_users: UnknownUserPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    pub replies: usize,
    pub reactions: usize,
    pub dangling_replies: usize,
    pub authorless: usize,
    pub self_loops_skipped: usize,
    pub unknown_users_skipped: usize,
    pub implicit_nodes: usize,
}

/// Weighted undirected user graph with a `UserId` → `NodeIndex` map.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraph<UserId, u32>,
    index: HashMap<UserId, NodeIndex>,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing index if the user is already present.
    pub fn add_user(&mut self, id: UserId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.index.insert(id, idx);
        idx
    }

    /// Add one unit of weight between `a` and `b`. Both must be present.
    pub fn bump(&mut self, a: UserId, b: UserId) -> Option<u32> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        let weight = match self.graph.find_edge(ia, ib) {
            Some(edge) => {
                let w = &mut self.graph[edge];
                *w += 1;
                *w
            }
            None => {
                self.graph.add_edge(ia, ib, 1);
                1
            }
        };
        Some(weight)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edge weight between two users; 0 when unconnected or unknown.
    pub fn weight(&self, a: UserId, b: UserId) -> u32 {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&ia), Some(&ib)) => self
                .graph
                .find_edge(ia, ib)
                .map(|e| self.graph[e])
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// All edges keyed by `(smaller id, larger id)`.
    pub fn edge_weights(&self) -> BTreeMap<(UserId, UserId), u32> {
        self.graph
            .edge_references()
            .map(|e| {
                let a = self.graph[e.source()];
                let b = self.graph[e.target()];
                ((a.min(b), a.max(b)), *e.weight())
            })
            .collect()
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.graph.node_indices().map(move |i| self.graph[i])
    }

    /// Underlying petgraph graph, for exporters.
    pub fn graph(&self) -> &UnGraph<UserId, u32> {
        &self.graph
    }
}

/// Reply and reaction events found in `messages`, in message-id order.
///
/// Replies whose target is not loaded and messages without an author are
/// left out and counted in `stats`.
pub fn interaction_events(
    messages: &BTreeMap<MessageId, Message>,
    stats: &mut BuildStats,
) -> Vec<InteractionEvent> {
    let mut events = Vec::new();

    for msg in messages.values() {
        let Some(author) = msg.author else {
            stats.authorless += 1;
            continue;
        };

        if let Some(target) = msg.reply_to {
            match messages.get(&target) {
                Some(original) => match original.author {
                    Some(to) => events.push(InteractionEvent::Reply {
                        from: author,
                        to,
                        message: msg.id,
                    }),
                    None => stats.authorless += 1,
                },
                None => {
                    debug!("message {} replies to unloaded message {}", msg.id, target);
                    stats.dangling_replies += 1;
                }
            }
        }

        events.extend(msg.reactions.iter().map(|&from| InteractionEvent::Reaction {
            from,
            to: author,
            message: msg.id,
        }));
    }

    events
}

/// Build the interaction graph for one group.
pub fn build(
    users: &BTreeMap<UserId, User>,
    messages: &BTreeMap<MessageId, Message>,
    options: &BuildOptions,
) -> Result<(InteractionGraph, BuildStats)> {
    let mut graph = InteractionGraph::new();
    for &id in users.keys() {
        graph.add_user(id);
    }

    let mut stats = BuildStats::default();
    let events = interaction_events(messages, &mut stats);
    for event in &events {
        apply(&mut graph, event, options, &mut stats)?;
    }

    info!(
        "Built interaction graph: {} nodes, {} edges ({} replies, {} reactions; skipped {} dangling replies, {} self-loops, {} unknown users)",
        graph.node_count(),
        graph.edge_count(),
        stats.replies,
        stats.reactions,
        stats.dangling_replies,
        stats.self_loops_skipped,
        stats.unknown_users_skipped,
    );
    Ok((graph, stats))
}

/// Fold one event into the graph according to `options`.
pub fn apply(
    graph: &mut InteractionGraph,
    event: &InteractionEvent,
    options: &BuildOptions,
    stats: &mut BuildStats,
) -> Result<()> {
    if event.is_self_loop() && options.self_loops == SelfLoopPolicy::Skip {
        debug!("skipping self-interaction on message {}", event.message());
        stats.self_loops_skipped += 1;
        return Ok(());
    }

    let (from, to) = event.endpoints();
    for user in [from, to] {
        if graph.contains(user) {
            continue;
        }
        match options.unknown_users {
            UnknownUserPolicy::Skip => {
                debug!("skipping event on message {}: unknown user {}", event.message(), user);
                stats.unknown_users_skipped += 1;
                return Ok(());
            }
            UnknownUserPolicy::AddNode => {
                graph.add_user(user);
                stats.implicit_nodes += 1;
            }
            UnknownUserPolicy::Reject => {
                return Err(GraphError::UnknownUser {
                    user,
                    message: event.message(),
                });
            }
        }
    }

    graph.bump(from, to);
    match event {
        InteractionEvent::Reply { .. } => stats.replies += 1,
        InteractionEvent::Reaction { .. } => stats.reactions += 1,
    }
    Ok(())
}
