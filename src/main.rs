use std::any::Any;
use std::cell::RefCell;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use model_viewer::app::{print_summary, ViewerApp, ViewerEvent};
use model_viewer::{loader, Renderer, ViewerCommand, ViewerConfig, ViewerSession};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let mut config = match &options.config {
        Some(path) => {
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            ViewerConfig::from_xml(&xml)
                .with_context(|| format!("failed to parse config {path}"))?
        }
        None => ViewerConfig::default(),
    };
    if let Some(asset) = &options.asset {
        config.asset_url = asset.clone();
    }

    if options.summary_only {
        return run_headless(config, &options);
    }

    match run_interactive(config.clone(), &options) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(config, &options)
            } else {
                Err(err)
            }
        }
    }
}

fn run_headless(config: ViewerConfig, options: &CliOptions) -> Result<()> {
    let asset = config.asset_url.clone();
    let mut session = ViewerSession::new(config);
    dispatch_all(&mut session, &options.early_commands);
    session.complete_load(loader::load_path(&asset));
    dispatch_all(&mut session, &options.commands);
    print_summary(&session);
    Ok(())
}

fn dispatch_all(session: &mut ViewerSession, commands: &[ViewerCommand]) {
    for command in commands {
        if !command.dispatch(session) {
            info!("{command} had no effect");
        }
    }
}

fn run_interactive(config: ViewerConfig, options: &CliOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(|| {
        EventLoopBuilder::<ViewerEvent>::with_user_event().build()
    }));
    panic::set_hook(default_hook);
    let mut event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Model Viewer")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window)))?;

    let asset = config.asset_url.clone();
    let session = Rc::new(RefCell::new(ViewerSession::new(config)));
    dispatch_all(&mut session.borrow_mut(), &options.early_commands);

    let proxy = event_loop.create_proxy();
    loader::spawn_load(asset, move |outcome| {
        if proxy.send_event(ViewerEvent::AssetLoaded(outcome)).is_err() {
            warn!("viewer closed before the asset finished loading");
        }
    })
    .context("failed to start the asset loader")?;

    let mut app =
        ViewerApp::new(renderer, Rc::clone(&session)).with_after_load(options.commands.clone());
    let mut last_error = None;

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(event, control_flow) {
            last_error = Some(err);
            control_flow.set_exit();
        }
    });

    print_summary(&session.borrow());

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "Usage: model-viewer [asset.obj] [--config <file.xml>] [--summary-only] \
                     [--command <cmd>]... [--early-command <cmd>]...";

#[derive(Debug, Default)]
struct CliOptions {
    asset: Option<String>,
    config: Option<String>,
    summary_only: bool,
    /// Dispatched after the asset has loaded.
    commands: Vec<ViewerCommand>,
    /// Dispatched before the asset has loaded.
    early_commands: Vec<ViewerCommand>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--config" => {
                    options.config = Some(args.next().ok_or_else(|| anyhow!(USAGE))?);
                }
                "--command" | "--early-command" => {
                    let value = args.next().ok_or_else(|| anyhow!(USAGE))?;
                    let command = value.parse::<ViewerCommand>()?;
                    if arg == "--command" {
                        options.commands.push(command);
                    } else {
                        options.early_commands.push(command);
                    }
                }
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                _ if options.asset.is_none() => options.asset = Some(arg),
                other => return Err(anyhow!("Unexpected argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_commands_in_order() {
        let options = parse(&[
            "helmet.obj",
            "--summary-only",
            "--early-command",
            "toggle-gloss",
            "--command",
            "apply-color=#ff0000",
            "--command",
            "home",
        ])
        .unwrap();
        assert_eq!(options.asset.as_deref(), Some("helmet.obj"));
        assert!(options.summary_only);
        assert_eq!(options.early_commands, vec![ViewerCommand::ToggleGloss]);
        assert_eq!(
            options.commands,
            vec![
                ViewerCommand::ApplyColor("#ff0000".into()),
                ViewerCommand::GoHome
            ]
        );
    }

    #[test]
    fn rejects_unknown_arguments() {
        assert!(parse(&["--run-scripts"]).is_err());
        assert!(parse(&["a.obj", "b.obj"]).is_err());
        assert!(parse(&["--command"]).is_err());
        assert!(parse(&["--command", "explode"]).is_err());
    }
}
