use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::args::LoadArgs;
use crate::config::{apply_config, load_config};
use crate::control::{bind_control_listener, serve_control};
use crate::error::AppResult;
use crate::routines::{RoutineContext, RoutinePolicy};
use crate::rtc::{ClientTimeouts, ConnectionTarget, RtcClient};
use crate::scheduler::{RoutineIntervals, Scheduler, spawn_scheduler};
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};
use crate::sink::{create_timing_log, describe_rows, spawn_result_sink};

pub(crate) fn run() -> AppResult<()> {
    let matches = LoadArgs::command().get_matches();
    let mut args = LoadArgs::from_arg_matches(&matches)?;
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

async fn run_async(args: LoadArgs) -> AppResult<()> {
    let (log_path, log_file) = create_timing_log(&args.output_dir).await?;
    info!(path = %log_path.display(), "Writing timing log");
    let (records, sink) = spawn_result_sink(log_file);

    let listener = match bind_control_listener(args.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            drop(records);
            if let Err(sink_err) = sink.finish().await {
                error!(error = %sink_err, "Failed to close timing log");
            }
            return Err(err);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_task = setup_signal_shutdown_handler(&shutdown_tx);

    let client = RtcClient::new(
        ConnectionTarget::new(args.host.as_str(), args.port),
        ClientTimeouts {
            connect: args.connect_timeout,
            write: args.write_timeout,
            read: args.read_timeout,
            close_grace: args.close_grace,
        },
    );
    info!(controller = %client.target(), package = args.package, "Controller target");
    let ctx = RoutineContext {
        api: Arc::new(client),
        records,
        policy: RoutinePolicy {
            package: args.package,
            delete_after_enqueue: !args.keep_queued,
            include_head: !args.exclude_head,
        },
    };
    let intervals = RoutineIntervals {
        enqueue: args.queue_interval,
        list: args.get_interval,
        relocate: args.move_interval,
    };
    let (scheduler, scheduler_task) = spawn_scheduler(
        Scheduler::new(ctx, intervals),
        shutdown_tx.subscribe(),
        args.shutdown_grace,
    );

    if args.no_autostart {
        info!("Routines idle until /start");
    } else {
        scheduler.start_all().await?;
    }
    let server = tokio::spawn(serve_control(listener, scheduler, shutdown_tx.subscribe()));

    drop(shutdown_rx.recv().await);

    server.await?;
    scheduler_task.await?;
    signal_task.await?;
    let report = sink.finish().await?;
    info!(
        path = %log_path.display(),
        "Timing log closed: {}",
        describe_rows(report.rows_written, report.rows_failed)
    );
    Ok(())
}
