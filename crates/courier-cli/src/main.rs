use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use courier_core::domain::payload_as;
use courier_core::{Envelope, Event, EventDispatcher, EventHandler, HandlerError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod settings;

use settings::Settings;

const ORDER_PLACED: &str = "order.placed";
const ORDER_SHIPPED: &str = "order.shipped";
const ORDER_REFUNDED: &str = "order.refunded";

/// 共有ディスパッチャに複数の producer から注文イベントを流すデモ
#[derive(Debug, Parser)]
#[command(name = "courier")]
struct Args {
    /// Config file (json, toml or yaml). `COURIER_*` variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug)]
struct Order {
    id: usize,
    producer: usize,
}

/// Counts what it sees.
struct Tally {
    seen: AtomicUsize,
}

impl Tally {
    fn new() -> Self {
        Self {
            seen: AtomicUsize::new(0),
        }
    }

    fn seen(&self) -> usize {
        self.seen.load(Ordering::Relaxed)
    }
}

impl EventHandler for Tally {
    fn handle(&self, _event: &dyn Event) -> Result<(), HandlerError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Registered under several names with one instance.
struct AuditLog;

impl EventHandler for AuditLog {
    fn handle(&self, event: &dyn Event) -> Result<(), HandlerError> {
        let order = payload_as::<Order>(event)
            .ok_or_else(|| HandlerError::new("audit: payload is not an Order"))?;
        let event_id = event.id().map(|id| id.to_string()).unwrap_or_default();
        debug!(
            event = event.name(),
            event_id = %event_id,
            order = order.id,
            producer = order.producer,
            at = %event.occurred_at(),
            "audit"
        );
        Ok(())
    }
}

/// Rejects every tenth order.
struct FraudCheck;

impl EventHandler for FraudCheck {
    fn handle(&self, event: &dyn Event) -> Result<(), HandlerError> {
        match payload_as::<Order>(event) {
            Some(order) if order.id % 10 == 9 => {
                Err(HandlerError::new(format!("order {} flagged", order.id)))
            }
            _ => Ok(()),
        }
    }
}

/// One producer: place orders and ship the ones that went through.
fn produce(dispatcher: &EventDispatcher, producer: usize, count: usize) -> usize {
    let mut rejected = 0;
    for id in 0..count {
        let placed = Envelope::new(ORDER_PLACED, Order { id, producer });
        if let Err(err) = dispatcher.dispatch(&placed) {
            warn!(producer, order = id, error = %err, "order rejected");
            rejected += 1;
            continue;
        }
        let shipped = Envelope::new(ORDER_SHIPPED, placed.into_payload());
        if let Err(err) = dispatcher.dispatch(&shipped) {
            warn!(producer, order = id, error = %err, "shipping failed");
        }
    }
    rejected
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = Settings::new(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(?settings, "starting courier demo");

    let dispatcher = Arc::new(EventDispatcher::with_config(settings.dispatcher.clone()));
    info!(
        failure_policy = ?dispatcher.config().failure_policy,
        producers = settings.producers,
        "dispatcher ready"
    );

    let placed = Arc::new(Tally::new());
    let shipped = Arc::new(Tally::new());
    let audit: Arc<dyn EventHandler> = Arc::new(AuditLog);

    dispatcher.register(ORDER_PLACED, placed.clone())?;
    dispatcher.register(ORDER_PLACED, Arc::new(FraudCheck))?;
    dispatcher.register(ORDER_PLACED, audit.clone())?;
    dispatcher.register(ORDER_SHIPPED, shipped.clone())?;
    dispatcher.register(ORDER_SHIPPED, audit.clone())?;

    if let Err(err) = dispatcher.register(ORDER_SHIPPED, audit.clone()) {
        info!(error = %err, "duplicate registration refused");
    }

    let mut producers = Vec::with_capacity(settings.producers);
    for producer in 0..settings.producers {
        let dispatcher = dispatcher.clone();
        let count = settings.events_per_producer;
        producers.push(tokio::task::spawn_blocking(move || {
            produce(&dispatcher, producer, count)
        }));
    }

    let mut rejected = 0;
    for producer in producers {
        rejected += producer.await?;
    }

    // nobody listens to refunds
    let invoked = dispatcher.dispatch(&Envelope::new(ORDER_REFUNDED, ()))?;

    println!("events:   {:?}", dispatcher.event_names());
    println!("placed:   {}", placed.seen());
    println!("shipped:  {}", shipped.seen());
    println!("rejected: {rejected}");
    println!("refund handlers invoked: {invoked}");

    dispatcher.unregister(ORDER_SHIPPED, &audit)?;
    info!(
        audited_shipping = dispatcher.has(ORDER_SHIPPED, &audit),
        audited_orders = dispatcher.has(ORDER_PLACED, &audit),
        "audit detached from shipping"
    );

    dispatcher.clear();
    info!(names = dispatcher.len(), "dispatcher cleared");
    Ok(())
}
