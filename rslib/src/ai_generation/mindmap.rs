use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_ROOT_NAME: &str = "Main Concept";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }
}

/// Build a tree from a markdown outline: `#` names the root, `##` and `###`
/// open first and second level branches, and `- ` items hang off whichever
/// branch was opened last. Unrecognised lines are ignored.
pub fn parse_mind_map(markdown: &str) -> MindMapNode {
    let mut root = MindMapNode::new(DEFAULT_ROOT_NAME);
    // how many levels below the root the most recent branch sits
    let mut depth: usize = 0;

    for line in markdown.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("### ") {
            let parent_depth = depth.min(1);
            open_node(&mut root, parent_depth)
                .children
                .push(MindMapNode::new(name.trim()));
            depth = parent_depth + 1;
        } else if let Some(name) = line.strip_prefix("## ") {
            root.children.push(MindMapNode::new(name.trim()));
            depth = 1;
        } else if let Some(name) = line.strip_prefix("# ") {
            let name = name.trim();
            if !name.is_empty() {
                root.name = name.to_string();
            }
        } else if let Some(detail) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            let detail = detail.trim();
            if !detail.is_empty() {
                open_node(&mut root, depth)
                    .children
                    .push(MindMapNode::new(detail));
            }
        }
    }

    root
}

/// Follow the last child `depth` times.
fn open_node(root: &mut MindMapNode, depth: usize) -> &mut MindMapNode {
    let mut node = root;
    for _ in 0..depth {
        if node.children.is_empty() {
            break;
        }
        let last = node.children.len() - 1;
        node = &mut node.children[last];
    }
    node
}
