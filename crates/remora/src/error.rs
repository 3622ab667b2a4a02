#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },

    #[error("edge {edge_id} refers to port #{port} which its node does not have")]
    MissingPort { edge_id: String, port: usize },

    #[error("node {node_id} has a negative or non-finite size")]
    InvalidSize { node_id: String },

    #[error("layout interrupted during {phase}")]
    Interrupted { phase: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
