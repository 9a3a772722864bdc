/***************************************/
/*        3rd party libraries          */
/***************************************/
use clap::Parser;
use crossbeam_channel as cbc;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::thread::Builder;

/***************************************/
/*           Local modules             */
/***************************************/
use elevator_bank::codec::StatusMessage;
use elevator_bank::config::Config;
use elevator_bank::dispatcher::{Dispatcher, DispatcherSnapshot, FloorNotice, Scheduler, SchedulerSummary};
use elevator_bank::elevator::{ElevatorPool, WorkerSummary};
use elevator_bank::network::{run_status_relay, RelaySink, UdpTransport};
use elevator_bank::shared::{FloorEvent, Request};
use elevator_bank::source::{read_requests, RequestSource, SourceSummary};
use elevator_bank::status::{FanOutSink, LogSink, StatusSink};
use elevator_bank::unwrap_or_exit;

#[derive(Parser, Debug)]
#[command(version, about = "Elevator bank simulation")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Request file, overrides [source] request_file
    #[arg(short, long)]
    requests: Option<String>,

    /// Number of elevators, overrides [elevator] n_elevators
    #[arg(short, long)]
    elevators: Option<usize>,

    /// "host:port" to relay completed requests to, overrides [network] status_addr
    #[arg(long)]
    status_addr: Option<String>,
}

#[derive(Serialize, Debug)]
struct RunSummary {
    total_requests: u64,
    source: SourceSummary,
    scheduler: SchedulerSummary,
    elevators: Vec<WorkerSummary>,
    dispatcher: DispatcherSnapshot,
}

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = unwrap_or_exit!(Config::load(&args.config));
    if let Some(requests) = args.requests {
        config.source.request_file = requests;
    }
    if let Some(elevators) = args.elevators {
        config.elevator.n_elevators = elevators;
    }
    if let Some(addr) = args.status_addr {
        config.network.status_addr = addr;
    }
    unwrap_or_exit!(config.check());

    let events = unwrap_or_exit!(read_requests(&config.source.request_file, Some(config.elevator.n_floors)));
    let total_requests = match config.dispatcher.total_requests {
        0 => events.len() as u64,
        n => n,
    };
    if total_requests > events.len() as u64 {
        warn!(
            "Only {} requests loaded but the run waits for {}; it will not finish on its own",
            events.len(),
            total_requests
        );
    }
    info!(
        "Serving {} requests with {} elevators",
        total_requests, config.elevator.n_elevators
    );

    // Status sinks
    let mut sinks: Vec<Arc<dyn StatusSink>> = vec![Arc::new(LogSink)];
    let mut relay_handle = None;
    if !config.network.status_addr.is_empty() {
        let transport = unwrap_or_exit!(UdpTransport::new("0.0.0.0:0", config.network.status_addr.as_str()));
        let (status_tx, status_rx) = cbc::unbounded::<StatusMessage>();
        sinks.push(Arc::new(RelaySink::new(status_tx)));

        let relay_thread = Builder::new().name("status_relay".into());
        relay_handle = Some(unwrap_or_exit!(relay_thread.spawn(move || {
            // A broken status link is fatal
            unwrap_or_exit!(run_status_relay(transport, status_rx))
        })));
    }

    // Initialize channels
    let (completion_tx, completion_rx) = cbc::unbounded::<Request>();
    let (floor_event_tx, floor_event_rx) = cbc::unbounded::<FloorEvent>();
    let (floor_notice_tx, floor_notice_rx) = cbc::unbounded::<FloorNotice>();
    let (_terminate_tx, terminate_rx) = cbc::unbounded::<()>();

    let dispatcher = Arc::new(
        Dispatcher::new(total_requests, Arc::new(FanOutSink::new(sinks)), completion_tx)
            .with_top_floor(config.elevator.n_floors),
    );

    // Start the scheduler
    let scheduler = Scheduler::new(
        Arc::clone(&dispatcher),
        floor_event_rx,
        floor_notice_tx,
        completion_rx,
        terminate_rx,
    );
    let scheduler_thread = Builder::new().name("scheduler".into());
    let scheduler_handle = unwrap_or_exit!(scheduler_thread.spawn(move || scheduler.run()));

    // Start the elevators
    let elevator_pool = unwrap_or_exit!(ElevatorPool::spawn(&config.elevator, &dispatcher));

    // Start the floors
    let source = RequestSource::new(events, floor_event_tx, floor_notice_rx);
    let source_thread = Builder::new().name("request_source".into());
    let source_handle = unwrap_or_exit!(source_thread.spawn(move || source.run()));

    // Any halted elevator ends the run, even while the others wait for work
    let elevators = unwrap_or_exit!(elevator_pool.join());

    let (scheduler, source) = match (scheduler_handle.join(), source_handle.join()) {
        (Ok(scheduler), Ok(source)) => (scheduler, source),
        _ => {
            error!("ERROR: scheduler or request source panicked");
            std::process::exit(1);
        }
    };

    let summary = RunSummary {
        total_requests,
        source,
        scheduler,
        elevators,
        dispatcher: dispatcher.snapshot(),
    };

    // The relay drains once the last sink, owned by the dispatcher, is gone
    drop(dispatcher);
    if let Some(Ok(sent)) = relay_handle.map(|h| h.join()) {
        info!("Relayed {} status messages", sent);
    }
    println!("{}", unwrap_or_exit!(serde_json::to_string_pretty(&summary)));
}
