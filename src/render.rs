//! Classic `tree` style rendering.
//!
//! ```text
//! 📁 project
//! ├── 📁 src
//! │   └── 📄 main.rs
//! └── 📄 README.md
//! ```
//!
//! [`render`] keeps the visual structure of every line in a [`TreeLine`] so
//! the rasterizer can draw guides as pixels instead of box-drawing glyphs.
//! [`TreeLine::to_text`] turns a line into its textual form and
//! [`parse_lines`] reads that form back.

use anyhow::{Result, bail};

use crate::tree::TreeNode;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const BLANK: &str = "    ";

/// Glyph joining a node to its parent's guide column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `├──`, more siblings follow.
    Tee,
    /// `└──`, last child of its parent.
    Elbow,
}

impl Connector {
    pub fn glyph(self) -> &'static str {
        match self {
            Connector::Tee => BRANCH,
            Connector::Elbow => LAST_BRANCH,
        }
    }
}

/// How directories and files are told apart in text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicators {
    /// `📁` / `📄` before the name.
    #[default]
    Emoji,
    /// Directory names get a trailing `/`.
    Plain,
}

/// One rendered node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Distance from the root (the root is 0).
    pub depth: usize,
    /// One flag per ancestor level between the root and this line's parent:
    /// `true` draws a continuing `│`, `false` leaves blank space.
    pub guides: Vec<bool>,
    /// `None` only for the root line.
    pub connector: Option<Connector>,
    pub is_directory: bool,
    pub name: String,
}

impl TreeLine {
    pub fn is_last(&self) -> bool {
        self.connector == Some(Connector::Elbow)
    }

    pub fn to_text(&self, indicators: Indicators) -> String {
        let mut line = String::new();
        for &continues in &self.guides {
            line.push_str(if continues { VERTICAL } else { BLANK });
        }
        if let Some(connector) = self.connector {
            line.push_str(connector.glyph());
        }
        match indicators {
            Indicators::Emoji => {
                line.push_str(if self.is_directory { "📁 " } else { "📄 " });
                line.push_str(&self.name);
            }
            Indicators::Plain => {
                line.push_str(&self.name);
                if self.is_directory {
                    line.push('/');
                }
            }
        }
        line
    }
}

/// Depth-first pre-order rendering, one line per node, root first.
pub fn render(root: &TreeNode) -> Vec<TreeLine> {
    let mut lines = vec![TreeLine {
        depth: 0,
        guides: Vec::new(),
        connector: None,
        is_directory: root.is_directory,
        name: root.name.clone(),
    }];
    render_children(root, &mut Vec::new(), &mut lines);
    lines
}

fn render_children(node: &TreeNode, guides: &mut Vec<bool>, lines: &mut Vec<TreeLine>) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == count;
        lines.push(TreeLine {
            depth: guides.len() + 1,
            guides: guides.clone(),
            connector: Some(if is_last {
                Connector::Elbow
            } else {
                Connector::Tee
            }),
            is_directory: child.is_directory,
            name: child.name.clone(),
        });

        if !child.children.is_empty() {
            guides.push(!is_last);
            render_children(child, guides, lines);
            guides.pop();
        }
    }
}

/// Render straight to text, one line per node.
pub fn render_text(root: &TreeNode, indicators: Indicators) -> String {
    let mut out = String::new();
    for line in render(root) {
        out.push_str(&line.to_text(indicators));
        out.push('\n');
    }
    out
}

/// A line read back from text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub depth: usize,
    pub is_directory: bool,
    pub name: String,
}

/// Recover depth and kind from text produced by [`render_text`].
pub fn parse_lines(text: &str, indicators: Indicators) -> Result<Vec<ParsedLine>> {
    let mut parsed = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let mut rest = line;
        let mut depth = 0;

        // The root line has no connector, so its name is taken verbatim.
        if number > 0 {
            while let Some(tail) = rest
                .strip_prefix(VERTICAL)
                .or_else(|| rest.strip_prefix(BLANK))
            {
                rest = tail;
                depth += 1;
            }
            rest = match rest
                .strip_prefix(BRANCH)
                .or_else(|| rest.strip_prefix(LAST_BRANCH))
            {
                Some(tail) => tail,
                None => bail!("line {}: missing connector", number + 1),
            };
            depth += 1;
        }

        let (is_directory, name) = match indicators {
            Indicators::Emoji => {
                if let Some(name) = rest.strip_prefix("📁 ") {
                    (true, name)
                } else if let Some(name) = rest.strip_prefix("📄 ") {
                    (false, name)
                } else {
                    bail!("line {}: missing indicator", number + 1);
                }
            }
            Indicators::Plain => match rest.strip_suffix('/') {
                Some(name) => (true, name),
                None => (false, rest),
            },
        };

        parsed.push(ParsedLine {
            depth,
            is_directory,
            name: name.to_owned(),
        });
    }

    Ok(parsed)
}
