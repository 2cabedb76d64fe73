use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};

use bot::activity;
use bot::bot::Bot;
use bot::config::BotParameters;
use bot::log::Logger;
use bot::mock::SimulatedRobot;
use bot::program::Program;
use bot::transport::{RecvLoop, SendLoop};

fn main() -> Result<()> {
    let parameters = BotParameters::load()?;
    let mut log_sink = Logger::init(parameters.log_level()?);

    // Every step is checked here, before anything moves
    let program = Program::load(&parameters.program)?;
    let queue = program.build(parameters.rotation)?;
    log::info!("Loaded {} instructions from {}", queue.len(), parameters.program.display());

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop)).context("Registering signal handler")?;
    }

    let (telemetry_tx, telemetry_rx) = channel();
    let (command_tx, command_rx) = channel();

    let (source, sink) = SimulatedRobot::new(parameters.transport_period()).split();
    let mut recv = RecvLoop::new(source, telemetry_tx);
    let mut send = SendLoop::new(sink, command_rx);
    let mut bot = Bot::new(queue, telemetry_rx, command_tx);

    let activities = [
        activity::spawn(
            "udp_send",
            parameters.transport_period(),
            parameters.transport_priority,
            Arc::clone(&stop),
            move || send.tick(),
        )?,
        activity::spawn(
            "udp_recv",
            parameters.transport_period(),
            parameters.transport_priority,
            Arc::clone(&stop),
            move || recv.tick(),
        )?,
        activity::spawn(
            "control_loop",
            parameters.control_period(),
            parameters.control_priority,
            Arc::clone(&stop),
            move || {
                bot.tick();
                Ok(())
            },
        )?,
    ];

    while !stop.load(Ordering::Relaxed) {
        log_sink.handle_logs();
        thread::sleep(Duration::from_millis(10));
    }

    for activity in activities {
        let _ = activity.join();
    }
    log_sink.handle_logs();

    Ok(())
}
