use std::collections::BTreeSet;

use rendezvous_core::ClientInfo;

/// A registered client process and the nodes it owns.
#[derive(Debug, Clone)]
pub struct Client {
    info: ClientInfo,
    nodes: BTreeSet<String>,
}

impl Client {
    pub fn new(info: ClientInfo) -> Self {
        Self {
            info,
            nodes: BTreeSet::new(),
        }
    }

    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    pub fn id(&self) -> u32 {
        self.info.id
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn add_node(&mut self, name: &str) {
        self.nodes.insert(name.to_string());
    }

    pub fn remove_node(&mut self, name: &str) {
        self.nodes.remove(name);
    }
}
