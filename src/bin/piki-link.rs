use clap::{Parser, Subcommand};
use piki_link::bridge::{CreateFuture, CreateLinkError};
use piki_link::config::{self, Config};
use piki_link::markdown::MarkdownNote;
use piki_link::pages::PageIndex;
use piki_link::replay::{parse_script, replay};
use piki_link::search::{SearchError, SearchFuture};
use piki_link::{LinkEditOptions, LinkEditor, TextRange, ToastKind, logging, normalize_href};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::task::LocalSet;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "piki-link")]
#[command(about = "Edit links in Markdown notes from the command line", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the href a typed value would be saved as
    Normalize {
        /// Text as typed into the link field
        input: String,
    },
    /// Open the link popover on a range of a note and replay a script
    Edit {
        /// Markdown file to edit
        file: PathBuf,
        /// Start of the selection (characters)
        #[arg(long)]
        from: Option<usize>,
        /// End of the selection (characters)
        #[arg(long)]
        to: Option<usize>,
        /// Page directory used for suggestions and new pages
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Commands to replay, e.g. "type guide down enter"
        #[arg(long)]
        script: Option<String>,
        /// Print the popover after the script ran
        #[arg(long)]
        show: bool,
        /// Save the result back to the file
        #[arg(long)]
        write: bool,
    },
}

struct EditArgs {
    file: PathBuf,
    from: Option<usize>,
    to: Option<usize>,
    pages: Option<PathBuf>,
    script: Option<String>,
    show: bool,
    write: bool,
}

fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
    match path.or_else(config::config_file_path) {
        Some(path) => config::load_config(&path).map_err(|e| e.to_string()),
        None => Ok(Config::default()),
    }
}

fn link_options(pages: Option<PathBuf>) -> LinkEditOptions {
    let options = LinkEditOptions::new()
        .on_open(|href| info!(href, "open link"))
        .on_remove(|| info!("link removed"));

    let Some(dir) = pages else {
        return options;
    };
    let index = Rc::new(PageIndex::new(dir));
    let search_index = Rc::clone(&index);

    options
        .with_search(move |query: &str| -> SearchFuture {
            let result = search_index.search(query).map_err(SearchError::Provider);
            Box::pin(async move { result })
        })
        .with_create(move |title: &str| -> CreateFuture {
            let result = index.create_page(title).map_err(CreateLinkError::Provider);
            Box::pin(async move { result })
        })
}

fn cmd_edit(args: EditArgs, config: Config) -> Result<(), String> {
    let content = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read '{}': {}", args.file.display(), e))?;
    let steps = parse_script(args.script.as_deref().unwrap_or("")).map_err(|e| e.to_string())?;

    let note = MarkdownNote::parse(content);
    let mut doc = note.document();
    let from = args.from.unwrap_or(0);
    let to = args.to.unwrap_or(doc.len());
    if from > to || to > doc.len() {
        return Err(format!(
            "Invalid range {}..{} for a note of {} characters",
            from,
            to,
            doc.len()
        ));
    }
    doc.select(TextRange::new(from, to));

    let show = args.show;
    let host = Rc::new(RefCell::new(doc));
    let options = link_options(args.pages);
    let dictionary = Rc::new(config.dictionary);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;
    let local = LocalSet::new();

    local.block_on(&runtime, async {
        let editor = LinkEditor::open_at_selection(Rc::clone(&host), options, dictionary)
            .ok_or_else(|| format!("Nothing to link at {}..{}", from, to))?
            .on_toast(|message, kind| match kind {
                ToastKind::Error => error!("{}", message),
                ToastKind::Info => info!("{}", message),
            });

        replay(&editor, &steps).await;
        editor.settle().await;

        if show
            && let Some(view) = editor.view()
        {
            println!("{}", view);
            println!();
        }

        let reconciliation = editor.close();
        debug!(?reconciliation, "popover closed");
        Ok::<(), String>(())
    })?;

    let markdown = note
        .render(&host.borrow())
        .map_err(|e| format!("Cannot write '{}' back: {}", args.file.display(), e))?;
    print!("{}", markdown);

    if args.write {
        fs::write(&args.file, &markdown)
            .map_err(|e| format!("Failed to save '{}': {}", args.file.display(), e))?;
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(args.debug || config.debug);

    let result = match args.command {
        Commands::Normalize { input } => {
            println!("{}", normalize_href(&input));
            Ok(())
        }
        Commands::Edit {
            file,
            from,
            to,
            pages,
            script,
            show,
            write,
        } => cmd_edit(
            EditArgs {
                file,
                from,
                to,
                pages,
                script,
                show,
                write,
            },
            config,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
