/// Which registered nodes an operation applies to.
///
/// Names are canonicalized before matching; names that are not registered
/// are silently ignored.
///
/// ```
/// use workvisor::Nodes;
///
/// assert_eq!(Nodes::from("w1"), Nodes::One("w1".into()));
/// assert_eq!(Nodes::from(["w1", "w2"]), Nodes::Many(vec!["w1".into(), "w2".into()]));
/// assert_eq!(Nodes::from(None::<&str>), Nodes::All);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Nodes {
    /// Every registered node.
    #[default]
    All,
    /// A single node.
    One(String),
    /// Several nodes.
    Many(Vec<String>),
}

impl Nodes {
    /// True for [`Nodes::One`].
    pub fn is_single(&self) -> bool {
        matches!(self, Nodes::One(_))
    }
}

impl From<&str> for Nodes {
    fn from(node: &str) -> Self {
        Nodes::One(node.to_string())
    }
}

impl From<String> for Nodes {
    fn from(node: String) -> Self {
        Nodes::One(node)
    }
}

impl From<Vec<String>> for Nodes {
    fn from(nodes: Vec<String>) -> Self {
        Nodes::Many(nodes)
    }
}

impl From<&[&str]> for Nodes {
    fn from(nodes: &[&str]) -> Self {
        Nodes::Many(nodes.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Nodes {
    fn from(nodes: [&str; N]) -> Self {
        Nodes::Many(nodes.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<Nodes>> From<Option<T>> for Nodes {
    fn from(nodes: Option<T>) -> Self {
        nodes.map_or(Nodes::All, Into::into)
    }
}
