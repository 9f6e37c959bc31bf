use uuid::Uuid;

/// Fire-and-forget alerts raised by the attendance and purchase flows.
/// Delivery (push, email, in-app) is another service's concern; this
/// interface is the hand-off point.
pub trait NotificationSink: Send + Sync {
    /// A user asked to join a private event; the organizer must decide.
    fn join_requested(&self, event_id: Uuid, organizer_id: Uuid, requester_id: Uuid);

    /// The organizer approved a pending join request.
    fn join_approved(&self, event_id: Uuid, attendee_id: Uuid);

    /// A payment reconciled into a valid ticket.
    fn ticket_issued(&self, event_id: Uuid, attendee_id: Uuid, ticket_id: Uuid);
}

/// Sink that records alerts as structured log events.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn join_requested(&self, event_id: Uuid, organizer_id: Uuid, requester_id: Uuid) {
        tracing::info!(
            %event_id,
            %organizer_id,
            %requester_id,
            "notification: join requested"
        );
    }

    fn join_approved(&self, event_id: Uuid, attendee_id: Uuid) {
        tracing::info!(%event_id, %attendee_id, "notification: join approved");
    }

    fn ticket_issued(&self, event_id: Uuid, attendee_id: Uuid, ticket_id: Uuid) {
        tracing::info!(
            %event_id,
            %attendee_id,
            %ticket_id,
            "notification: ticket issued"
        );
    }
}


#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Alert {
        JoinRequested {
            event_id: Uuid,
            organizer_id: Uuid,
            requester_id: Uuid,
        },
        JoinApproved {
            event_id: Uuid,
            attendee_id: Uuid,
        },
        TicketIssued {
            event_id: Uuid,
            attendee_id: Uuid,
            ticket_id: Uuid,
        },
    }

    /// Captures alerts in memory for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub alerts: Mutex<Vec<Alert>>,
    }

    impl NotificationSink for RecordingSink {
        fn join_requested(&self, event_id: Uuid, organizer_id: Uuid, requester_id: Uuid) {
            self.alerts.lock().unwrap().push(Alert::JoinRequested {
                event_id,
                organizer_id,
                requester_id,
            });
        }

        fn join_approved(&self, event_id: Uuid, attendee_id: Uuid) {
            self.alerts.lock().unwrap().push(Alert::JoinApproved {
                event_id,
                attendee_id,
            });
        }

        fn ticket_issued(&self, event_id: Uuid, attendee_id: Uuid, ticket_id: Uuid) {
            self.alerts.lock().unwrap().push(Alert::TicketIssued {
                event_id,
                attendee_id,
                ticket_id,
            });
        }
    }
}
