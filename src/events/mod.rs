use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Used after a write has already been committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Domain event dropped");
            metrics::counter!("procurement_events.dropped", 1);
        }
    }
}

/// Domain events published after successful writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),
    SupplierStatusChanged {
        supplier_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Catalog events
    MaterialCreated(Uuid),
    MaterialUpdated(Uuid),
    MaterialDeleted(Uuid),
    CompanyCreated(Uuid),
    CompanyUpdated(Uuid),
    CompanyDeleted(Uuid),

    // Document events
    QuoteRequestCreated(Uuid),
    QuoteRequestUpdated(Uuid),
    QuoteRequestDeleted(Uuid),
    PurchaseOrderCreated {
        purchase_order_id: Uuid,
        sequence_number: i64,
    },
    PurchaseOrderUpdated(Uuid),
    PurchaseOrderDeleted(Uuid),
    DocumentStatusChanged {
        document_type: String,
        document_id: Uuid,
        old_status: String,
        new_status: String,
    },
    SupplierDocumentsArchived {
        supplier_id: Uuid,
        quote_requests: u64,
        purchase_orders: u64,
    },
    PriceHistoryRecorded {
        purchase_order_id: Uuid,
        entries: usize,
    },

    // Data management events
    BulkImportCompleted {
        kind: String,
        success_count: usize,
        failure_count: usize,
    },
    DataPurged {
        account_id: Uuid,
        data_type: String,
        deleted: u64,
    },
    PurchaseOrderSequenceReset(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Short stable name used for metrics labels and log fields
    pub fn name(&self) -> &'static str {
        match self {
            Event::SupplierCreated(_) => "supplier_created",
            Event::SupplierUpdated(_) => "supplier_updated",
            Event::SupplierDeleted(_) => "supplier_deleted",
            Event::SupplierStatusChanged { .. } => "supplier_status_changed",
            Event::MaterialCreated(_) => "material_created",
            Event::MaterialUpdated(_) => "material_updated",
            Event::MaterialDeleted(_) => "material_deleted",
            Event::CompanyCreated(_) => "company_created",
            Event::CompanyUpdated(_) => "company_updated",
            Event::CompanyDeleted(_) => "company_deleted",
            Event::QuoteRequestCreated(_) => "quote_request_created",
            Event::QuoteRequestUpdated(_) => "quote_request_updated",
            Event::QuoteRequestDeleted(_) => "quote_request_deleted",
            Event::PurchaseOrderCreated { .. } => "purchase_order_created",
            Event::PurchaseOrderUpdated(_) => "purchase_order_updated",
            Event::PurchaseOrderDeleted(_) => "purchase_order_deleted",
            Event::DocumentStatusChanged { .. } => "document_status_changed",
            Event::SupplierDocumentsArchived { .. } => "supplier_documents_archived",
            Event::PriceHistoryRecorded { .. } => "price_history_recorded",
            Event::BulkImportCompleted { .. } => "bulk_import_completed",
            Event::DataPurged { .. } => "data_purged",
            Event::PurchaseOrderSequenceReset(_) => "purchase_order_sequence_reset",
            Event::Generic { .. } => "generic",
        }
    }
}

// Define a trait for handling events. Handlers implementing this trait will process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: &Event) -> Result<(), String>;
}

/// Writes every event to the log; the default subscriber.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: &Event) -> Result<(), String> {
        match event {
            Event::SupplierStatusChanged {
                supplier_id,
                old_status,
                new_status,
            } => info!(
                %supplier_id,
                old_status = %old_status,
                new_status = %new_status,
                "Supplier status changed"
            ),
            Event::DocumentStatusChanged {
                document_type,
                document_id,
                old_status,
                new_status,
            } => info!(
                document_type = %document_type,
                %document_id,
                old_status = %old_status,
                new_status = %new_status,
                "Document status changed"
            ),
            Event::SupplierDocumentsArchived {
                supplier_id,
                quote_requests,
                purchase_orders,
            } => info!(
                %supplier_id,
                quote_requests,
                purchase_orders,
                "Documents archived after supplier deactivation"
            ),
            Event::BulkImportCompleted {
                kind,
                success_count,
                failure_count,
            } => {
                if *failure_count > 0 {
                    warn!(
                        kind = %kind,
                        success_count,
                        failure_count,
                        "Bulk import finished with failed rows"
                    );
                } else {
                    info!(kind = %kind, success_count, "Bulk import finished");
                }
            }
            Event::DataPurged {
                account_id,
                data_type,
                deleted,
            } => warn!(%account_id, data_type = %data_type, deleted, "Data purged"),
            other => info!(event = other.name(), "Received event: {:?}", other),
        }
        Ok(())
    }
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(rx: mpsc::Receiver<Event>) {
    process_events_with_handlers(rx, vec![Arc::new(LoggingEventHandler)]).await
}

pub async fn process_events_with_handlers(
    mut rx: mpsc::Receiver<Event>,
    handlers: Vec<Arc<dyn EventHandler>>,
) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        metrics::counter!("procurement_events.processed", 1);
        for handler in &handlers {
            if let Err(e) = handler.handle_event(&event).await {
                error!(event = event.name(), error = %e, "Event handler failed");
            }
        }
    }

    info!("Event channel closed; event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct Recorder(Mutex<Vec<Event>>);

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle_event(&self, event: &Event) -> Result<(), String> {
            self.0.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle_event(&self, _event: &Event) -> Result<(), String> {
            Err("boom".into())
        }
    }

    #[tokio::test]
    async fn events_reach_every_handler_even_when_one_fails() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

        let supplier_id = Uuid::new_v4();
        sender.send(Event::SupplierCreated(supplier_id)).await.unwrap();
        sender
            .send(Event::PurchaseOrderCreated {
                purchase_order_id: Uuid::new_v4(),
                sequence_number: 1,
            })
            .await
            .unwrap();
        drop(sender);

        process_events_with_handlers(rx, vec![Arc::new(Failing), recorder.clone()]).await;

        let seen = recorder.0.lock().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Event::SupplierCreated(supplier_id));
        assert_eq!(seen[1].name(), "purchase_order_created");
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::with_data("x".into())).await.is_err());
        // must not panic
        sender.send_or_log(Event::MaterialDeleted(Uuid::new_v4())).await;
    }
}
