// Serialized token trie
//
// Node arena laid out breadth-first: the children of a node are contiguous and
// sorted by byte, so lookup is a binary search per level and the whole trie is
// a flat Vec shared read-only by every worker.

use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieNode {
    pub byte: u8,
    /// Index of the first child in the arena.
    pub first_child: u32,
    pub child_count: u16,
    /// A token ends at this node.
    pub accepts: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialTrie {
    nodes: Vec<TrieNode>,
    max_len: usize,
}

#[derive(Default)]
struct BuildNode {
    children: BTreeMap<u8, usize>,
    accepts: bool,
}

impl SerialTrie {
    /// Build a trie accepting exactly `tokens`. An empty list matches nothing.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut build = vec![BuildNode::default()];
        let mut max_len = 0;
        let mut any = false;
        for token in tokens {
            let token = token.as_ref();
            any = true;
            max_len = max_len.max(token.len());
            let mut node = 0;
            for &b in token {
                node = match build[node].children.get(&b) {
                    Some(&child) => child,
                    None => {
                        build.push(BuildNode::default());
                        let child = build.len() - 1;
                        build[node].children.insert(b, child);
                        child
                    }
                };
            }
            build[node].accepts = true;
        }
        if !any {
            return SerialTrie::default();
        }

        let mut nodes = vec![TrieNode {
            byte: 0,
            first_child: 0,
            child_count: 0,
            accepts: build[0].accepts,
        }];
        let mut queue = VecDeque::from([(0usize, 0usize)]);
        while let Some((src, dst)) = queue.pop_front() {
            let first = nodes.len();
            for (&byte, &child) in &build[src].children {
                nodes.push(TrieNode {
                    byte,
                    first_child: 0,
                    child_count: 0,
                    accepts: build[child].accepts,
                });
                queue.push_back((child, nodes.len() - 1));
            }
            nodes[dst].first_child = first as u32;
            nodes[dst].child_count = build[src].children.len() as u16;
        }

        SerialTrie { nodes, max_len }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    /// Whether `key` is exactly one of the tokens.
    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        if self.nodes.is_empty() || key.len() > self.max_len {
            return false;
        }
        let mut node = 0usize;
        for &b in key {
            let n = &self.nodes[node];
            let first = n.first_child as usize;
            let children = &self.nodes[first..first + n.child_count as usize];
            match children.binary_search_by_key(&b, |c| c.byte) {
                Ok(i) => node = first + i,
                Err(_) => return false,
            }
        }
        self.nodes[node].accepts
    }
}
