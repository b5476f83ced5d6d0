//! CLI command implementations

use anyhow::{Context, bail};
use clap::Subcommand;
use magnetide_core::config::MagnetideConfig;
use magnetide_search::{
    MediaSearchService, MovieSearchOptions, SearchRequest, TorrentSearchOptions,
};
use serde::Serialize;
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search one of the upstream indexes
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Show full details of a torrent from the generic index
    Details {
        /// Provider-local torrent id
        id: String,
    },
    /// Start the JSON API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Cache successful searches in memory
        #[arg(long)]
        cache: bool,
    },
}

/// Search targets
#[derive(Subcommand)]
pub enum SearchTarget {
    /// Search the movie-metadata index
    Movies {
        /// Free-text query
        query: String,
        /// Embed posters as data URIs
        #[arg(long)]
        posters: bool,
    },
    /// Search the generic torrent index
    Torrents {
        /// Free-text query (ignored for Top100)
        #[arg(default_value = "")]
        query: String,
        /// Category: All, Audio, Video, Applications, Games, Porn, Other, Top100
        #[arg(short, long)]
        category: Option<String>,
        /// Sort key: name, date, size, seeders, leechers
        #[arg(short, long)]
        sort: Option<String>,
        /// Sort order: asc or desc
        #[arg(short, long)]
        order: Option<String>,
    },
}

impl SearchTarget {
    fn into_request(self) -> SearchRequest {
        match self {
            SearchTarget::Movies { query, posters } => SearchRequest::Movies {
                query,
                options: MovieSearchOptions {
                    inline_posters: posters,
                },
            },
            SearchTarget::Torrents {
                query,
                category,
                sort,
                order,
            } => SearchRequest::Torrents {
                query,
                options: TorrentSearchOptions {
                    category,
                    sort_by: sort,
                    order,
                },
            },
        }
    }
}

/// Handle CLI command execution
///
/// # Errors
/// - Search service could not be constructed
/// - The search or lookup failed
/// - The server could not start
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = MagnetideConfig::from_env();

    match command {
        Commands::Search { target } => {
            let service = MediaSearchService::new(&config.providers)?;
            let response = service.search(&target.into_request()).await;
            print_json(&response)?;
            if let Some(error) = response.error_message() {
                bail!("search failed: {error}");
            }
        }
        Commands::Details { id } => {
            let service = MediaSearchService::new(&config.providers)?;
            let details = service
                .torrent_details(&id)
                .await
                .with_context(|| format!("failed to fetch details for torrent {id}"))?;
            print_json(&details)?;
        }
        Commands::Serve { host, port, cache } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.cache.enabled |= cache;

            info!(
                "Starting server on {}:{}",
                config.server.host, config.server.port
            );
            magnetide_web::run_server(config).await?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    fn parse(args: &[&str]) -> Commands {
        TestCli::try_parse_from(std::iter::once("magnetide").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_torrent_search_arguments() {
        let Commands::Search { target } = parse(&[
            "search", "torrents", "big buck", "--category", "Video", "--sort", "seeders",
            "--order", "desc",
        ]) else {
            panic!("expected search command");
        };

        assert_eq!(
            target.into_request(),
            SearchRequest::Torrents {
                query: "big buck".to_string(),
                options: TorrentSearchOptions::default()
                    .category("Video")
                    .sort_by("seeders")
                    .order("desc"),
            }
        );
    }

    #[test]
    fn test_top100_needs_no_query() {
        let Commands::Search { target } = parse(&["search", "torrents", "-c", "Top100"]) else {
            panic!("expected search command");
        };

        let request = target.into_request();
        assert_eq!(request.query(), "");
    }

    #[test]
    fn test_movie_search_posters_flag() {
        let Commands::Search { target } = parse(&["search", "movies", "dune", "--posters"]) else {
            panic!("expected search command");
        };

        assert_eq!(
            target.into_request(),
            SearchRequest::Movies {
                query: "dune".to_string(),
                options: MovieSearchOptions::with_posters(),
            }
        );
    }

    #[test]
    fn test_serve_overrides() {
        let Commands::Serve { host, port, cache } =
            parse(&["serve", "--host", "0.0.0.0", "-p", "8080", "--cache"])
        else {
            panic!("expected serve command");
        };

        assert_eq!(host.as_deref(), Some("0.0.0.0"));
        assert_eq!(port, Some(8080));
        assert!(cache);
    }
}
