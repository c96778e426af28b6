use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use env_logger::{Builder, Env};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::model::{Page, DEFAULT_PAGE_SIZE};
use crate::output::{self, OutputFormat, SelectionSummary};
use crate::pagination::{Completion, LoadState, PageTicket};
use crate::session::{Options, Session, SourceKind, TableView};
use crate::source::http::DEFAULT_BASE_URL;
use crate::source::{FetchError, HttpOptions};
use crate::utils;

type LoadResult = (PageTicket, Result<Page, FetchError>);

const HELP: &str = "\
Commands:
  n, next              next page
  p, prev              previous page
  g, page <N>          go to page N (1-based)
  c, check <ids>       set the checked rows of this page (ids not listed are unchecked)
  t, toggle <id>       flip one row of this page
  s, select <count>    select the first <count> records of the whole collection
  clear                empty the selection
  l, list              show the selection
  w, save [file]       write the selection (default: --output)
  r, reload            reload this page
  h, help              this help
  q, quit              exit
";

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Page(usize),
    Check(Vec<u64>),
    Toggle(u64),
    Select(String),
    Clear,
    List,
    Save(Option<String>),
    Reload,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let cmd = match head.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "g" | "page" => Command::Page(utils::parse_page_number(rest)?),
        "c" | "check" => Command::Check(utils::parse_id_list_csv(rest)?),
        "t" | "toggle" => {
            let id = rest
                .parse::<u64>()
                .map_err(|_| format!("invalid id '{rest}'"))?;
            Command::Toggle(id)
        }
        // the count box: raw text, digit filtering happens in the session
        "s" | "select" => Command::Select(rest.to_string()),
        "clear" => Command::Clear,
        "l" | "list" => Command::List,
        "w" | "save" => Command::Save((!rest.is_empty()).then(|| rest.to_string())),
        "r" | "reload" => Command::Reload,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}', type 'help'")),
    };
    Ok(Some(cmd))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }
    let start_page = args.page.or(cfg.start_page).unwrap_or(1);
    if start_page == 0 {
        return Err("invalid start_page, pages start at 1".to_string());
    }

    // an explicit --url beats a demo collection from the config file
    let demo = match args.url {
        Some(_) => args.demo,
        None => args.demo.or(cfg.demo),
    };
    let source = match demo {
        Some(count) => SourceKind::Demo(count),
        None => {
            let defaults = HttpOptions::default();
            SourceKind::Http(HttpOptions {
                base_url: args
                    .url
                    .or(cfg.base_url)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout_seconds: args
                    .timeout
                    .or(cfg.timeout)
                    .unwrap_or(defaults.timeout_seconds),
                proxy: args.proxy.or(cfg.proxy),
                user_agent: args
                    .user_agent
                    .or(cfg.user_agent)
                    .unwrap_or(defaults.user_agent),
                rate: args.rate.or(cfg.rate).unwrap_or(defaults.rate),
            })
        }
    };

    let output = args.output.or(cfg.output);
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        options: Options {
            source,
            page_size,
            start_page: start_page - 1,
            reuse_cached_page: !args.no_reuse_page && cfg.reuse_cached_page.unwrap_or(true),
        },
        output,
        output_format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
    })
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let _ = Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
}

fn spawn_load(session: &mut Session, page: usize, tx: &mpsc::Sender<LoadResult>) {
    let ticket = session.on_page_change(page);
    let load = session.load_for(ticket);
    let tx = tx.clone();
    task::spawn(async move {
        let out = load.await;
        // the receiver only goes away on shutdown
        let _ = tx.send(out).await;
    });
}

fn first_line(value: &str) -> &str {
    value.lines().next().unwrap_or_default()
}

fn render_table(view: &TableView<'_>) {
    let pages = view.page_count.max(1);
    let status = match view.state {
        LoadState::Idle => "ready".green().to_string(),
        LoadState::Loading { page } => format!("loading page {}", page + 1).yellow().to_string(),
        LoadState::Errored { page, message } => {
            format!("page {} failed: {}", page + 1, message).red().to_string()
        }
    };
    println!();
    println!(
        ":: page {}/{} :: {} records :: {} selected :: {}",
        (view.page.index + 1).to_string().bold(),
        pages,
        view.page.total_count,
        view.selection.len().to_string().cyan(),
        status
    );
    if view.page.is_empty() {
        println!("   (no records)");
        return;
    }
    let first = view.page.first_position(view.page_size);
    for (i, r) in view.page.items.iter().enumerate() {
        let checked = view.checked.iter().any(|c| c.id == r.id);
        let mark = if checked {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        println!(
            "{} {:>5} {:>8}  {:<40} {:<18} {:<28} {}",
            mark,
            first + i + 1,
            r.id.to_string().dimmed(),
            utils::truncate_chars(&r.title, 40),
            utils::truncate_chars(&r.origin, 18),
            utils::truncate_chars(first_line(&r.attribution), 28),
            r.years()
        );
    }
}

fn render_selection(session: &Session) {
    let records = session.selection().list();
    println!();
    println!("Selected artworks ({})", records.len().to_string().cyan());
    for r in records {
        println!("  {:>8}  {}", r.id.to_string().dimmed(), r.title);
    }
}

async fn save_selection(
    session: &Session,
    path: Option<&str>,
    format: Option<OutputFormat>,
) -> Result<(), String> {
    let Some(path) = path else {
        return Err("no output file, use 'save <file>' or --output".to_string());
    };
    let summary = SelectionSummary::new(session.selection().list());
    let written = output::write_summary(path, format, &summary).await?;
    println!(
        ":: saved {} records to {} ({:?})",
        summary.count,
        path,
        written
    );
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let mut session = Session::new(run.options.clone()).map_err(|e| e.to_string())?;
    match &run.options.source {
        SourceKind::Http(http) => println!(":: Source    : {}", http.base_url),
        SourceKind::Demo(count) => println!(":: Source    : demo collection ({count} records)"),
    }
    println!(":: Page size : {}", run.options.page_size);
    println!(":: Type 'help' for commands");

    let (tx, mut rx) = mpsc::channel::<LoadResult>(32);
    let start_page = session.start_page();
    spawn_load(&mut session, start_page, &tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some((ticket, result)) = rx.recv() => {
                match session.on_page_loaded(ticket, result) {
                    Completion::Applied => render_table(&session.view()),
                    Completion::Stale => {}
                    Completion::Failed(e) => {
                        println!("{} {}", "error:".red(), e);
                        render_table(&session.view());
                    }
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => return Err(format!("failed to read input: {e}")),
                };
                let cmd = match parse_command(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{} {}", "error:".red(), e);
                        continue;
                    }
                };
                match cmd {
                    Command::Next => match session.next_page() {
                        Some(page) => spawn_load(&mut session, page, &tx),
                        None => println!("already on the last page"),
                    },
                    Command::Prev => match session.prev_page() {
                        Some(page) => spawn_load(&mut session, page, &tx),
                        None => println!("already on the first page"),
                    },
                    Command::Page(page) => match session.controller().last_known_page_count() {
                        Some(count) if page >= count => {
                            println!("page {} is out of range (1-{})", page + 1, count.max(1));
                        }
                        _ => spawn_load(&mut session, page, &tx),
                    },
                    Command::Reload => {
                        let page = session.page().index;
                        spawn_load(&mut session, page, &tx);
                    }
                    Command::Check(ids) => {
                        let delta = session.check_visible(&ids);
                        log::debug!("checkbox delta: +{:?} -{:?}", delta.added, delta.removed);
                        render_table(&session.view());
                    }
                    Command::Toggle(id) => match session.toggle(id) {
                        Some(_) => render_table(&session.view()),
                        None => println!("record {id} is not on this page"),
                    },
                    Command::Select(raw) => {
                        let pb = ProgressBar::new_spinner();
                        pb.set_style(
                            ProgressStyle::with_template("{spinner} {msg}")
                                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                        );
                        pb.set_message("walking pages");
                        pb.enable_steady_tick(Duration::from_millis(120));
                        let res = session.submit_count(&raw).await;
                        pb.finish_and_clear();
                        match res {
                            Ok(Some(out)) => {
                                println!(
                                    ":: selected {} of {} requested ({} pages fetched)",
                                    out.selected, out.requested, out.pages_fetched
                                );
                                render_table(&session.view());
                            }
                            Ok(None) => println!("enter a number of rows"),
                            Err(e) => println!("{} {}", "error:".red(), e),
                        }
                    }
                    Command::Clear => {
                        session.clear_selection();
                        render_table(&session.view());
                    }
                    Command::List => render_selection(&session),
                    Command::Save(path) => {
                        let path = path.or_else(|| run.output.clone());
                        let saved =
                            save_selection(&session, path.as_deref(), run.output_format).await;
                        if let Err(e) = saved {
                            println!("{} {}", "error:".red(), e);
                        }
                    }
                    Command::Help => print!("{HELP}"),
                    Command::Quit => break,
                }
            }
        }
    }

    if let Some(path) = run.output.as_deref() {
        save_selection(&session, Some(path), run.output_format).await?;
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };
    init_logger(args.verbose);

    if args.write_config {
        let path = config::resolve_path(args.config.as_deref()).map_err(|e| e.to_string())?;
        if config::write_default_config(&path).map_err(|e| e.to_string())? {
            println!("wrote {}", path.display());
        } else {
            println!("{} already exists", path.display());
        }
        return Ok(());
    }

    let cfg = match config::resolve_path(args.config.as_deref()) {
        Ok(path) => {
            config::load_config(&path, args.config.is_some()).map_err(|e| e.to_string())?
        }
        Err(e) => {
            log::debug!("{e}");
            ConfigFile::default()
        }
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
