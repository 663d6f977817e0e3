//! Custom tracing layers for the axon mesh

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::{self, MakeWriter, format};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{NodeContextData, NodeContextGuard};

/// Layer that attaches node context to spans
///
/// Every span opened while a [`NodeContextGuard`] is active carries a
/// [`NodeContextExtension`] with that node's identity.
pub struct NodeContextLayer;

impl NodeContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NodeContextLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct NodeContextExtension {
    pub data: NodeContextData,
}

impl<S> Layer<S> for NodeContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(node_ctx) = NodeContextGuard::current() {
                span.extensions_mut()
                    .insert(NodeContextExtension { data: node_ctx });
            }
        }
    }
}

/// A JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(
    writer: W,
    jsonl: &JsonlConfig,
) -> fmt::Layer<S, format::JsonFields, format::Format<format::Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(jsonl.include_current_span)
        .with_span_list(jsonl.include_spans)
        .flatten_event(jsonl.flatten_events)
        .with_file(jsonl.include_location)
        .with_line_number(jsonl.include_location)
        .with_thread_ids(jsonl.include_thread_info)
        .with_thread_names(jsonl.include_thread_info)
        .with_writer(writer)
}
