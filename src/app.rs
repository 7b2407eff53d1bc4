use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::api::types::PredictionInput;
use crate::api::{ApiClient, ApiClientOptions, SearchSource};
use crate::cli::args::{CliArgs, Command, HistoryArgs, PredictArgs, StatsArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::history::{HistoryPager, HistorySource, DEFAULT_PAGE_SIZE};
use crate::output;
use crate::render::{self, Renderer, TerminalRenderer};
use crate::stats;

fn print_banner() {
    const BANNER: &str = r#"
                        __
   ____  ____  _____   / /_  ____  _      __
  / __ \/ __ \/ ___/  / __ \/ __ \| | /| / /
 / / / / /_/ (__  )  / / / / /_/ /| |/ |/ /
/_/ /_/\____/____/  /_/ /_/\____/ |__/|__/

       v0.1.0 - no-show prediction console
    "#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_url: String,
    timeout: u64,
    proxy: Option<String>,
    page_size: usize,
    stats_limit: usize,
    output: Option<String>,
    output_format: Option<String>,
    no_color: bool,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let command = args
        .command
        .ok_or_else(|| "a subcommand is required (try `noshow health`)".to_string())?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let api_url = args
        .api_url
        .or(cfg.api_url)
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    let stats_limit = cfg.stats_limit.unwrap_or(20);

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = args.output_format.or(cfg.output_format);

    Ok(RunConfig {
        api_url,
        timeout,
        proxy,
        page_size,
        stats_limit,
        output,
        output_format,
        no_color,
        command,
    })
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();
    format_kv_line("API", &run.api_url);
    format_kv_line(
        "HTTP",
        &format!(
            "timeout={}s proxy={}",
            run.timeout,
            if run.proxy.is_some() { "on" } else { "off" }
        ),
    );
    format_kv_line("History", &format!("page-size={}", run.page_size));
    println!();

    let client = ApiClient::new(ApiClientOptions {
        base_url: run.api_url.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
    })
    .map_err(|e| e.to_string())?;

    match run.command.clone() {
        Command::Predict(args) => run_predict(&client, &run, &args).await,
        Command::History(args) => run_history(client, &run, &args).await,
        Command::Stats(args) => run_stats(&client, &run, &args).await,
        Command::Show { id } => run_show(&client, &id).await,
        Command::Health => run_health(&client).await,
    }
}

async fn run_health(client: &ApiClient) -> Result<(), String> {
    let pb = spinner("checking service health");
    let health = client.health().await;
    pb.finish_and_clear();
    render::print_health(&health.map_err(|e| e.to_string())?);
    Ok(())
}

async fn run_show(client: &ApiClient, id: &str) -> Result<(), String> {
    let pb = spinner("fetching prediction");
    let detail = client.prediction(id).await;
    pb.finish_and_clear();
    render::print_detail(&detail.map_err(|e| e.to_string())?);
    Ok(())
}

async fn run_stats(client: &ApiClient, run: &RunConfig, args: &StatsArgs) -> Result<(), String> {
    let limit = args.limit.unwrap_or(run.stats_limit);
    let pb = spinner("fetching recent predictions");
    let page = client.recent(0, limit).await;
    pb.finish_and_clear();
    let page = page.map_err(|e| e.to_string())?;
    render::print_stats(&stats::summarize(&page.records));
    println!(
        "{}",
        format!(
            ":: aggregated over {} of {} stored predictions",
            page.records.len(),
            page.total_count
        )
        .dimmed()
    );
    Ok(())
}

async fn run_predict(client: &ApiClient, run: &RunConfig, args: &PredictArgs) -> Result<(), String> {
    let input = PredictionInput {
        customer_name: args.name.trim().to_string(),
        party_size: args.party_size,
        deposit_paid: args.deposit,
        lead_time_days: args.lead_time,
        is_repeated_guest: args.repeat_guest,
        previous_cancellations: args.cancellations,
        special_requests_count: args.special_requests,
        visit_month: args.month,
    };
    input.validate().map_err(|e| e.to_string())?;

    let pb = spinner("scoring reservation");
    let result = client.submit(&input).await;
    pb.finish_and_clear();
    render::print_result(&input, &result.map_err(|e| e.to_string())?);

    // refresh the history preview and stats, like the submit flow does
    let pager = HistoryPager::with_page_size(client.clone(), run.page_size);
    match pager.reset().await {
        Ok(view) => {
            println!();
            println!("recent predictions:");
            TerminalRenderer::new().render(&view);
            let snapshot = pager.snapshot();
            render::print_count_line(&snapshot);
            render::print_stats(&stats::summarize(&snapshot.records));
        }
        Err(e) => {
            println!("{}", format!(":: history refresh failed: {e}").dimmed());
        }
    }
    Ok(())
}

async fn run_history(client: ApiClient, run: &RunConfig, args: &HistoryArgs) -> Result<(), String> {
    match args.search.as_deref() {
        Some(query) => {
            let source = SearchSource::new(client, query.to_string());
            history_session(source, run, args).await
        }
        None => history_session(client, run, args).await,
    }
}

async fn history_session<S: HistorySource>(
    source: S,
    run: &RunConfig,
    args: &HistoryArgs,
) -> Result<(), String> {
    let pager = HistoryPager::with_page_size(source, run.page_size);
    let mut renderer = TerminalRenderer::new();

    let pb = spinner("loading prediction history");
    let first = pager.reset().await;
    pb.finish_and_clear();
    renderer.render(&first.map_err(|e| e.to_string())?);
    render::print_count_line(&pager.snapshot());

    if args.all {
        while pager.load_more().is_some() {
            let view = pager.load_next().await.map_err(|e| e.to_string())?;
            renderer.render(&view);
        }
        render::print_count_line(&pager.snapshot());
    } else if args.pages > 1 {
        for _ in 1..args.pages {
            if pager.load_more().is_none() {
                break;
            }
            let view = pager.load_next().await.map_err(|e| e.to_string())?;
            renderer.render(&view);
        }
        render::print_count_line(&pager.snapshot());
    }

    if args.interactive {
        interactive_loop(&pager, &mut renderer).await;
    }

    if let Some(path) = run.output.as_deref() {
        let snapshot = pager.snapshot();
        export_history(path, run.output_format.as_deref(), &snapshot.records).await?;
        println!(
            "{}",
            format!(":: wrote {} records to {path}", snapshot.records.len()).dimmed()
        );
    }
    Ok(())
}

// Failed loads are reported and the prompt comes back, so retry is just
// pressing the same key again.
async fn interactive_loop<S: HistorySource>(
    pager: &HistoryPager<S>,
    renderer: &mut TerminalRenderer,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if let Some(button) = pager.load_more() {
            println!("{}", button.label().bold());
        }
        println!("{}", ":: [m]ore [l]ess [r]eload [q]uit".dimmed());
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        match line.trim().to_lowercase().as_str() {
            "m" | "more" => match pager.load_next().await {
                Ok(view) => {
                    renderer.render(&view);
                    render::print_count_line(&pager.snapshot());
                }
                Err(e) => println!("{}", format!("failed to load more: {e}").red()),
            },
            "l" | "less" => {
                renderer.render(&pager.collapse());
                render::print_count_line(&pager.snapshot());
            }
            "r" | "reload" => match pager.reset().await {
                Ok(view) => {
                    renderer.render(&view);
                    render::print_count_line(&pager.snapshot());
                }
                Err(e) => println!("{}", format!("failed to reload: {e}").red()),
            },
            "q" | "quit" | "" => break,
            other => println!("unknown command '{other}'"),
        }
    }
}

async fn export_history(
    path: &str,
    format: Option<&str>,
    records: &[crate::api::types::PredictionRecord],
) -> Result<(), String> {
    let format = format
        .and_then(output::OutputFormat::parse)
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(output::OutputFormat::Text);

    let export = output::build_records(records);
    let rendered = match format {
        output::OutputFormat::Text => output::render_text(&export),
        output::OutputFormat::Json => output::render_json(&export),
        output::OutputFormat::Csv => output::render_csv(&export),
    };

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = CliArgs::parse();

    if args.init_config {
        let path = config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("config file at {}", path.display());
        if args.command.is_none() {
            return Ok(());
        }
    }

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
