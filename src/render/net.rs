//! Loading `file://` subresources (stylesheets, fonts, images) for Blitz.
//!
//! Blitz asks its net provider for every linked resource while the HTML is
//! parsed. [`FileProvider`] reads local files synchronously and hands the
//! parsed resources to a channel; the rasterizer drains that channel into the
//! document before resolving layout.

use std::fs;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use blitz_dom::net::Resource;
use blitz_dom::BaseDocument;
use blitz_traits::net::{BoxedHandler, Bytes, NetProvider, Request, SharedCallback};

/// Net provider that serves `file://` URLs from disk and ignores the rest.
pub(crate) struct FileProvider {
    callback: SharedCallback<Resource>,
}

impl FileProvider {
    /// Create a provider and the receiving end of its resource queue.
    pub(crate) fn new() -> (Arc<Self>, ResourceQueue) {
        let (sender, receiver) = mpsc::channel();
        let callback: SharedCallback<Resource> =
            Arc::new(move |_doc_id: usize, result: Result<Resource, Option<String>>| {
                match result {
                    Ok(resource) => {
                        // The queue outlives every fetch; a closed queue only
                        // means the document is already gone.
                        let _ = sender.send(resource);
                    }
                    Err(message) => {
                        tracing::warn!(
                            reason = message.as_deref().unwrap_or("unknown"),
                            "failed to parse linked resource"
                        );
                    }
                }
            });
        (Arc::new(Self { callback }), ResourceQueue(receiver))
    }
}

impl NetProvider<Resource> for FileProvider {
    fn fetch(&self, doc_id: usize, request: Request, handler: BoxedHandler<Resource>) {
        let url = request.url;
        if url.scheme() != "file" {
            tracing::debug!(%url, "skipping non-file resource");
            return;
        }
        let Ok(path) = url.to_file_path() else {
            tracing::warn!(%url, "resource URL is not a local path");
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded resource");
                handler.bytes(doc_id, Bytes::from(bytes), self.callback.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read resource");
            }
        }
    }
}

/// Resources fetched by a [`FileProvider`] and not yet applied.
pub(crate) struct ResourceQueue(Receiver<Resource>);

impl ResourceQueue {
    /// Apply every queued resource to `doc`. Returns how many were applied.
    pub(crate) fn drain_into(&self, doc: &mut BaseDocument) -> usize {
        let mut applied = 0;
        while let Ok(resource) = self.0.try_recv() {
            doc.load_resource(resource);
            applied += 1;
        }
        applied
    }
}
