//! Radix tree over byte strings.
//!
//! Path-compressed trie used as the ordered prefix index for reversed domain
//! keys. Each edge carries a non-empty byte run; children are kept sorted by
//! their first byte so lookups binary-search a node's edges and a depth-first
//! walk yields keys in lexicographic order.

/// Radix tree node
#[derive(Debug, Clone, Default)]
struct Node {
    /// Edge label leading into this node (empty only for the root)
    prefix: Vec<u8>,
    /// Marks a key termination point
    leaf: bool,
    /// Children sorted by the first byte of their prefix
    edges: Vec<Node>,
}

impl Node {
    fn leaf(bytes: &[u8]) -> Self {
        Self {
            prefix: bytes.to_vec(),
            leaf: true,
            edges: Vec::new(),
        }
    }

    #[inline]
    fn find_edge(&self, first: u8) -> Option<&Node> {
        self.edges
            .binary_search_by_key(&first, |n| n.prefix[0])
            .ok()
            .map(|idx| &self.edges[idx])
    }

    fn add_edge(&mut self, child: Node) {
        let first = child.prefix[0];
        let pos = self
            .edges
            .binary_search_by_key(&first, |n| n.prefix[0])
            .unwrap_or_else(|pos| pos);
        self.edges.insert(pos, child);
    }

    /// Split this node's prefix at `at`, pushing the tail and the current
    /// children down into a single new child.
    fn split(&mut self, at: usize) {
        let tail = self.prefix.split_off(at);
        let child = Node {
            prefix: tail,
            leaf: self.leaf,
            edges: std::mem::take(&mut self.edges),
        };
        self.leaf = false;
        self.edges.push(child);
    }
}

/// Ordered prefix tree with longest-prefix lookup
#[derive(Debug, Clone, Default)]
pub struct RadixTree {
    root: Node,
    len: usize,
}

impl RadixTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key. Returns false if the key was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        let mut node = &mut self.root;
        let mut search = key.as_bytes();

        loop {
            let Some(&first) = search.first() else {
                if node.leaf {
                    return false;
                }
                node.leaf = true;
                self.len += 1;
                return true;
            };

            let idx = match node.edges.binary_search_by_key(&first, |n| n.prefix[0]) {
                Ok(idx) => idx,
                Err(pos) => {
                    node.edges.insert(pos, Node::leaf(search));
                    self.len += 1;
                    return true;
                }
            };

            let common = common_prefix_len(search, &node.edges[idx].prefix);
            if common == node.edges[idx].prefix.len() {
                search = &search[common..];
                node = &mut node.edges[idx];
                continue;
            }

            // Key diverges inside the edge: split it
            let child = &mut node.edges[idx];
            child.split(common);
            search = &search[common..];
            if search.is_empty() {
                child.leaf = true;
            } else {
                child.add_edge(Node::leaf(search));
            }
            self.len += 1;
            return true;
        }
    }

    /// Exact key lookup
    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        let mut node = &self.root;
        let mut search = key.as_bytes();

        while let Some(&first) = search.first() {
            match node.find_edge(first) {
                Some(child) if search.starts_with(&child.prefix) => {
                    search = &search[child.prefix.len()..];
                    node = child;
                }
                _ => return false,
            }
        }

        node.leaf
    }

    /// Byte length of the longest key in the tree that is a prefix of `key`.
    pub fn longest_prefix_len(&self, key: &[u8]) -> Option<usize> {
        let mut node = &self.root;
        let mut consumed = 0;
        let mut last = node.leaf.then_some(0);

        while let Some(&first) = key.get(consumed) {
            let Some(child) = node.find_edge(first) else {
                break;
            };
            if !key[consumed..].starts_with(&child.prefix) {
                break;
            }
            consumed += child.prefix.len();
            node = child;
            if node.leaf {
                last = Some(consumed);
            }
        }

        last
    }

    /// Longest key in the tree that is a prefix of `key`, borrowed from `key`.
    pub fn longest_prefix<'k>(&self, key: &'k str) -> Option<&'k str> {
        self.longest_prefix_len(key.as_bytes())
            .and_then(|len| key.get(..len))
    }

    /// All keys in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        let mut buf = Vec::new();
        collect_keys(&self.root, &mut buf, &mut out);
        out
    }
}

fn collect_keys(node: &Node, buf: &mut Vec<u8>, out: &mut Vec<String>) {
    let mark = buf.len();
    buf.extend_from_slice(&node.prefix);
    if node.leaf {
        out.push(String::from_utf8_lossy(buf).into_owned());
    }
    for child in &node.edges {
        collect_keys(child, buf, out);
    }
    buf.truncate(mark);
}

#[inline]
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
