#![forbid(unsafe_code)]

//! `narwhal` builds hierarchical graphs with ports, exchanges them as ELK-style JSON and lays
//! them out.
//!
//! # Features
//!
//! - `layout` (default): the layout invoker with the layered and fixed engines
//!   (`narwhal::layout`)

pub use narwhal_core::*;

#[cfg(feature = "layout")]
pub mod layout {
    pub use narwhal_layout::{
        AlgorithmRegistry, CancelToken, DeterministicTextMeasurer, FixedEngine, Interruption,
        LayoutEngine, LayoutError, LayoutInvoker, LayoutMonitor, LayeredEngine, TextMeasurer,
        TextMetrics, TextStyle,
    };

    use narwhal_core::codec::{DecodeOptions, EncodeOptions, decode_with, encode_with};
    use narwhal_core::{DecodeError, EncodeError, Graph};

    #[derive(Debug, thiserror::Error)]
    pub enum BridgeError {
        #[error(transparent)]
        Decode(#[from] DecodeError),
        #[error(transparent)]
        Encode(#[from] EncodeError),
        #[error(transparent)]
        Layout(#[from] LayoutError),
    }

    pub type Result<T> = std::result::Result<T, BridgeError>;

    /// Decodes `text`, lays it out and encodes the result (executor-free).
    pub fn layout_json_sync(invoker: &LayoutInvoker, text: &str) -> Result<String> {
        let mut graph = narwhal_core::decode(text)?;
        invoker.layout(&mut graph)?;
        Ok(narwhal_core::encode(&graph, false)?)
    }

    pub async fn layout_json(invoker: &LayoutInvoker, text: &str) -> Result<String> {
        layout_json_sync(invoker, text)
    }

    /// Bundles an invoker with codec options so embedders make one call per document.
    ///
    /// All work is CPU-bound and performed on the calling thread; the async methods exist for
    /// callers that already live on an executor.
    #[derive(Debug, Clone, Default)]
    pub struct Bridge {
        pub invoker: LayoutInvoker,
        pub decode: DecodeOptions,
        pub encode: EncodeOptions,
        pub monitor: LayoutMonitor,
    }

    impl Bridge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
            self.invoker = LayoutInvoker::new(registry);
            self
        }

        pub fn with_monitor(mut self, monitor: LayoutMonitor) -> Self {
            self.monitor = monitor;
            self
        }

        pub fn decode_sync(&self, text: &str) -> Result<Graph> {
            Ok(decode_with(text, self.decode)?)
        }

        pub fn encode_sync(&self, graph: &Graph) -> Result<String> {
            Ok(encode_with(graph, self.encode)?)
        }

        pub fn layout_sync(&self, graph: &mut Graph) -> Result<()> {
            Ok(self.invoker.layout_with(graph, &self.monitor)?)
        }

        /// Decode, layout and encode in one step. The input is not modified on failure.
        pub fn layout_json_sync(&self, text: &str) -> Result<String> {
            let mut graph = self.decode_sync(text)?;
            self.layout_sync(&mut graph)?;
            self.encode_sync(&graph)
        }

        pub async fn layout(&self, graph: &mut Graph) -> Result<()> {
            self.layout_sync(graph)
        }

        pub async fn layout_json(&self, text: &str) -> Result<String> {
            self.layout_json_sync(text)
        }
    }
}
