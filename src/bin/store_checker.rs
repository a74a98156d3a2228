use actor_store::{
    ConceptRepository, Locale, StoreConfig, StoreError, WikiEntityRepository, WikiSearchNameRepository,
    WikiTitleRepository,
};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "store_checker")]
#[command(about = "Inspect and prune the entity stores of one locale", long_about = None)]
struct Cli {
    /// Base data directory (defaults to ACTOR_STORE_DATA_DIR or ./data)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    lang: String,
    #[arg(long)]
    country: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show record counts of every collection
    Counts,
    /// Show the most popular root name hashes
    Popular {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long, default_value_t = 1)]
        min_words: u32,
    },
    /// Delete concepts at or below a popularity threshold
    Prune {
        #[arg(long)]
        threshold: u32,
        /// Only abbreviations
        #[arg(long, conflicts_with = "one_word")]
        abbr: bool,
        /// Only single-word names that are not abbreviations
        #[arg(long)]
        one_word: bool,
    },
}

fn main() -> Result<(), StoreError> {
    actor_store::init_tracing("store_checker");

    let cli = Cli::parse();
    let locale = Locale::new(&cli.lang, &cli.country)?;
    let config = match cli.data_dir {
        Some(dir) => StoreConfig::new(dir, locale),
        None => StoreConfig::from_env(locale),
    };

    println!("[store_checker] Data directory: {}", config.data_dir().display());

    match cli.command {
        Commands::Counts => {
            let concepts = ConceptRepository::open(&config)?;
            let entities = WikiEntityRepository::open(&config)?;
            let names = WikiSearchNameRepository::open(&config)?;
            let titles = WikiTitleRepository::open(&config)?;

            println!("collection\tcount");
            println!("concepts\t{}", concepts.count());
            println!("wiki-entities\t{}", entities.count());
            println!("wiki-search-names\t{}", names.count());
            println!("wiki-titles\t{}", titles.count());
        }
        Commands::Popular { limit, skip, min_words } => {
            let concepts = ConceptRepository::open(&config)?;
            let rows = concepts.get_popular_root_name_hashes(limit, skip, min_words);

            if rows.is_empty() {
                println!("No concepts found.");
            }
            println!("hash\tpopularity\tnames");
            for row in rows {
                let names = concepts.get_by_ids(row.ids.as_slice()).iter().map(|c| c.name.as_str()).join(", ");
                println!("{}\t{}\t{}", row.hash, row.popularity, names);
            }
        }
        Commands::Prune { threshold, abbr, one_word } => {
            let mut concepts = ConceptRepository::open(&config)?;
            let before = concepts.count();

            let removed = if abbr {
                concepts.delete_unpopular_abbreviations(threshold)?
            } else if one_word {
                concepts.delete_unpopular_one_words(threshold)?
            } else {
                concepts.delete_unpopular(threshold)?
            };

            println!("[store_checker] Removed {} of {} concepts (threshold {})", removed, before, threshold);
            concepts.close()?;
        }
    }

    Ok(())
}
