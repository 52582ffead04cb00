use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Fire-and-forget analytics. The shell forwards these to whatever sink it
/// has; the core never waits on them.

pub struct Telemetry<Ev> {
    context: CapabilityContext<TelemetryOperation, Ev>,
}

impl<Ev> Capability<Ev> for Telemetry<Ev> {
    type Operation = TelemetryOperation;
    type MappedSelf<MappedEv> = Telemetry<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Telemetry::new(self.context.map_event(f))
    }
}

impl<Ev> Telemetry<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TelemetryOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn event(&self, name: &str, fields: Vec<(String, String)>) {
        self.notify(TelemetryOperation::Event {
            name: name.to_string(),
            fields,
        });
    }

    pub fn error(&self, code: &str, message: &str) {
        self.notify(TelemetryOperation::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    pub fn counter(&self, name: &str, value: u64) {
        self.notify(TelemetryOperation::Counter {
            name: name.to_string(),
            value,
        });
    }

    fn notify(&self, operation: TelemetryOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryOperation {
    Event {
        name: String,
        fields: Vec<(String, String)>,
    },
    Error {
        code: String,
        message: String,
    },
    Counter {
        name: String,
        value: u64,
    },
}

impl Operation for TelemetryOperation {
    type Output = ();
}
