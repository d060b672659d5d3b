use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use gallery_core::{AlbumOrder, GroupBy, LibraryOptions, Media, MediaItem, PinRegistry, PinStore, Zone};

#[derive(Parser)]
#[command(name = "gallery-timeline", version, about = "Show a folder of photos and videos as a dated timeline with albums")]
struct Cli {
    /// Folder to index; each sub-folder becomes an album
    root: PathBuf,

    /// Extra media outside the catalog (file:// URI or path), shown without album
    #[arg(long = "open", value_name = "LOCATOR")]
    open: Vec<String>,

    /// JSON file holding pinned album ids
    #[arg(long)]
    pins: Option<PathBuf>,

    /// Pin an album id (requires --pins)
    #[arg(long = "pin", value_name = "ALBUM_ID", requires = "pins", allow_hyphen_values = true)]
    pin: Vec<i64>,

    /// Unpin an album id (requires --pins)
    #[arg(long = "unpin", value_name = "ALBUM_ID", requires = "pins", allow_hyphen_values = true)]
    unpin: Vec<i64>,

    /// Timeline sections: "day" or "month"
    #[arg(long, default_value = "day")]
    group: GroupBy,

    /// strftime-style format for day labels
    #[arg(long, default_value = gallery_core::FULL_DATE_FORMAT)]
    date_format: String,

    /// Album order: date-desc, date-asc, label-asc or label-desc (pinned albums always first)
    #[arg(long, default_value = "date-desc")]
    album_order: AlbumOrder,

    /// Format dates in UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Print the library as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let options = LibraryOptions {
        date_format: cli.date_format,
        group_by: cli.group,
        album_order: cli.album_order,
        zone: if cli.utc { Zone::Utc } else { Zone::Local },
    };
    let resolvers = options.resolvers();

    let pinned: BTreeSet<i64> = match &cli.pins {
        Some(path) => {
            let mut store = PinStore::open(path)?;
            if !cli.pin.is_empty() || !cli.unpin.is_empty() {
                for id in &cli.pin {
                    store.pin(*id);
                }
                for id in &cli.unpin {
                    store.unpin(*id);
                }
                store.save()?;
                log::info!("Saved pins to {}", store.path().display());
            }
            store.list_all()
        }
        None => BTreeSet::new(),
    };

    let catalog = gallery_core::DirectoryCatalog::new(&cli.root, &resolvers);
    let mut media = gallery_core::load_media(&catalog)?;
    for locator in &cli.open {
        match Media::from_locator(locator, &resolvers) {
            Ok(m) => media.push(m),
            Err(err) => eprintln!("Skipping {}: {}", locator, err),
        }
    }

    let library = gallery_core::build_library(media, &pinned, &options, &resolvers);

    if cli.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &library)?;
        println!();
    } else {
        for item in &library.timeline {
            match item {
                MediaItem::Header { text, media, .. } => println!("\n{} ({})", text, media.len()),
                MediaItem::Leaf { media, .. } => {
                    let marker = if media.is_degraded() { " [external]" } else { "" };
                    println!("  {}{}", media.label(), marker);
                }
            }
        }
        println!("\nAlbums:");
        for album in &library.albums {
            let pin = if album.pinned { "*" } else { " " };
            println!(
                "{} {:<24} {:>5}  {}  (id {})",
                pin, album.label, album.count, album.thumbnail_path, album.id
            );
        }
    }

    eprintln!(
        "Done! {} media files in {} sections, {} albums, {} trashed ({:.2}s)",
        library.media_count(),
        library.header_count(),
        library.albums.len(),
        library.trash.len(),
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
