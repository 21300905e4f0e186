//! Inkwell - A terminal reader for WordPress blogs
#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use inkwell::api::{ContentApi, WordPressClient};
use inkwell::{CollectionKind, Config, Library, Post, PostId, SqliteStore, Toggled, catalog};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = parse_args()?;
    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
        Command::Config => return init_config(),
        _ => {}
    }

    let config = Config::load()?;
    let store = SqliteStore::open().context("Failed to open local library")?;
    let library = Library::mount(Arc::new(store));
    library.hydrate().await;

    let client = WordPressClient::from_config(&config);

    let result = match command {
        Command::Posts {
            search,
            category,
            limit,
        } => list_posts(&client, &library, &config, search.as_deref(), category, limit).await,
        Command::Show { id } => show_post(&client, &library, &config, id).await,
        Command::Toggle { kind, id } => toggle(&client, &library, kind, id).await,
        Command::Collection { kind } => {
            list_collection(&library, &config, kind);
            Ok(())
        }
        Command::Categories => list_categories(&client).await,
        Command::Open { id } => open_post(&client, &library, id).await,
        Command::Help | Command::Version | Command::Config => Ok(()),
    };

    // Write-backs run in the background; let them land before exit
    library.flush().await;
    result
}

/// CLI commands
enum Command {
    Posts {
        search: Option<String>,
        category: Option<u64>,
        limit: usize,
    },
    Show {
        id: PostId,
    },
    Toggle {
        kind: CollectionKind,
        id: PostId,
    },
    Collection {
        kind: CollectionKind,
    },
    Categories,
    Open {
        id: PostId,
    },
    Config,
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    let Some(command) = args.get(1) else {
        return Ok(Command::Posts {
            search: None,
            category: None,
            limit: 20,
        });
    };

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "config" => Ok(Command::Config),
        "categories" | "cats" => Ok(Command::Categories),

        "posts" | "ls" => {
            let search = flag_value(&args, &["--search", "-s"]);
            let category = flag_value(&args, &["--category", "-c"])
                .map(|s| s.parse().context("Category must be a numeric id"))
                .transpose()?;
            let limit = flag_value(&args, &["--limit", "-l"])
                .and_then(|s| s.parse().ok())
                .unwrap_or(20);
            Ok(Command::Posts {
                search,
                category,
                limit,
            })
        }

        "show" => Ok(Command::Show {
            id: post_id_arg(&args)?,
        }),
        "open" => Ok(Command::Open {
            id: post_id_arg(&args)?,
        }),
        "favorite" | "fav" => Ok(Command::Toggle {
            kind: CollectionKind::Favorites,
            id: post_id_arg(&args)?,
        }),
        "bookmark" | "bm" => Ok(Command::Toggle {
            kind: CollectionKind::Bookmarks,
            id: post_id_arg(&args)?,
        }),

        other => CollectionKind::from_str(other)
            .map(|kind| Command::Collection { kind })
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown command: {other}\nRun 'inkwell --help' for usage")
            }),
    }
}

fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn post_id_arg(args: &[String]) -> Result<PostId> {
    args.get(2)
        .ok_or_else(|| anyhow::anyhow!("Missing post id"))?
        .parse()
        .context("Post id must be a number")
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
Inkwell - A terminal reader for WordPress blogs

USAGE:
    inkwell                            List latest posts
    inkwell [COMMAND]

COMMANDS:
    posts [OPTIONS]                    List posts
      Options:
        -s, --search <text>            Match title or excerpt
        -c, --category <id>            Only posts in this category
        -l, --limit <n>                Number of posts (default: 20)

    show <id>                          Read a post with comments and related posts
    open <id>                          Open a post in the browser
    categories                         List categories

    favorite <id>                      Add or remove a favorite
    bookmark <id>                      Add or remove a bookmark
    favorites                          List favorites (works offline)
    bookmarks                          List bookmarks (works offline)

    config                             Write a default config file

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

CONFIG:
    {}
"#,
        inkwell::LOGO,
        config_path
    );
}

fn print_version() {
    println!("inkwell {}", inkwell::VERSION);
}

fn init_config() -> Result<()> {
    let path = Config::default_path()?;
    if path.exists() {
        println!("Config already exists: {}", path.display());
    } else {
        Config::default().save()?;
        println!("✓ Wrote default config to {}", path.display());
    }
    Ok(())
}

fn print_post_row(library: &Library, post: &Post, width: usize) {
    let flags = library.flags(post);
    let date = post
        .date()
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_default();

    println!(
        "\n{} {} [{}] {}  {}",
        flags.favorite_icon(),
        flags.bookmark_icon(),
        post.id,
        post.title().unwrap_or("(untitled)"),
        date
    );
    let preview = post.preview(width.saturating_mul(2));
    if !preview.is_empty() {
        println!("{}", textwrap::indent(&textwrap::fill(&preview, width), "    "));
    }
}

async fn list_posts(
    client: &WordPressClient,
    library: &Library,
    config: &Config,
    search: Option<&str>,
    category: Option<u64>,
    limit: usize,
) -> Result<()> {
    let posts = client.fetch_posts().await?;

    let mut shown: Vec<&Post> = match search {
        Some(keyword) => catalog::search(&posts, keyword),
        None => posts.iter().collect(),
    };
    if let Some(category) = category {
        shown = catalog::in_category(shown, category);
    }

    if shown.is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    for post in shown.into_iter().take(limit) {
        print_post_row(library, post, config.excerpt_width);
    }
    Ok(())
}

async fn show_post(
    client: &WordPressClient,
    library: &Library,
    config: &Config,
    id: PostId,
) -> Result<()> {
    let (posts, categories) = tokio::join!(client.fetch_posts(), client.fetch_categories());
    let posts = posts?;
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {}", e);
        Vec::new()
    });

    let post = match posts.iter().find(|p| p.id == id) {
        Some(post) => post.clone(),
        None => client.fetch_post(id).await?,
    };

    let flags = library.flags(&post);
    println!(
        "{} {}  {}",
        flags.favorite_icon(),
        flags.bookmark_icon(),
        post.title().unwrap_or("(untitled)")
    );
    let names = catalog::category_names(&categories, &post.categories());
    if !names.is_empty() {
        println!("{}", names.join(" · "));
    }
    if let Some(link) = post.link() {
        println!("{}", link);
    }
    println!("{}", "─".repeat(config.excerpt_width));
    let body = catalog::strip_html(post.content().unwrap_or_default());
    println!("{}", textwrap::fill(&body, config.excerpt_width));

    let comments = client.fetch_comments(id, 1).await?;
    println!("\nComments ({})", comments.len());
    for comment in comments {
        let indent = if comment.is_reply() { "    " } else { "" };
        println!(
            "\n{}{} · {}",
            indent,
            comment.author_name,
            comment.date.format("%b %d, %Y")
        );
        let text = catalog::strip_html(&comment.content.rendered);
        let width = config.excerpt_width.saturating_sub(indent.len());
        println!("{}", textwrap::indent(&textwrap::fill(&text, width), indent));
    }

    let related = catalog::related(&posts, &post, config.related_limit);
    if !related.is_empty() {
        println!("\nRelated posts");
        for other in related {
            println!("  [{}] {}", other.id, other.title().unwrap_or("(untitled)"));
        }
    }
    Ok(())
}

async fn toggle(
    client: &WordPressClient,
    library: &Library,
    kind: CollectionKind,
    id: PostId,
) -> Result<()> {
    let store = library.store(kind);

    // Removing works offline, with or without a cached copy
    let post = match store.local_post(id) {
        Some(post) => post,
        None => client.fetch_post(id).await?,
    };

    let outcome = store.toggle_with_outcome(&post);
    let title = post.title().unwrap_or("(untitled)");
    match outcome {
        Toggled::Added => println!("✓ Added \"{}\" to {}", title, kind),
        Toggled::Removed => println!("✓ Removed \"{}\" from {}", title, kind),
    }
    Ok(())
}

fn list_collection(library: &Library, config: &Config, kind: CollectionKind) {
    let posts = library.store(kind).list();
    println!("{} ({})", kind, posts.len());

    if posts.is_empty() {
        println!("\nNothing here yet.");
        return;
    }
    for post in &posts {
        print_post_row(library, post, config.excerpt_width);
    }
}

async fn list_categories(client: &WordPressClient) -> Result<()> {
    let categories = client.fetch_categories().await?;
    if categories.is_empty() {
        println!("No categories.");
    }
    for category in categories {
        println!("  [{}] {} ({})", category.id, category.name, category.count);
    }
    Ok(())
}

async fn open_post(client: &WordPressClient, library: &Library, id: PostId) -> Result<()> {
    let cached = CollectionKind::all()
        .iter()
        .find_map(|kind| library.store(*kind).snapshot().entity(id).cloned());

    let post = match cached {
        Some(post) => post,
        None => client.fetch_post(id).await?,
    };

    let link = post
        .link()
        .ok_or_else(|| anyhow::anyhow!("Post {} has no link", id))?;
    println!("Opening {}", link);
    open::that(link).context("Failed to open browser")?;
    Ok(())
}
