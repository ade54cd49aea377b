use clap::*;
use clap_num::maybe_hex;
use log::{debug, error, info, LevelFilter};
use rafile::{Options, RandomAccessFile};

struct Request<'a> {
    offset: u64,
    size: Option<u64>,
    lines: bool,
    write: Option<&'a str>,
    newline: bool,
}

fn run(path: &str, options: Options, request: Request) -> rafile::Result<()> {
    let mut file = RandomAccessFile::new().with_options(options);
    file.open(path)?;
    info!("Opened '{}' ({} bytes)", path, file.len()?);

    let offset = i64::try_from(request.offset).map_err(|_| {
        rafile::RandomAccessError::InvalidArgument(format!("offset {} is too large", request.offset))
    })?;
    file.set_position(offset)?;
    debug!("Cursor at {}", file.position());

    if let Some(text) = request.write {
        if request.newline {
            file.write_line(text)?;
        } else {
            file.write(text)?;
        }
        info!("Wrote {} bytes, cursor now at {}", file.position() - request.offset, file.position());
        file.set_position(offset)?;
    }

    if request.lines {
        for (index, line) in file.read_lines()?.iter().enumerate() {
            println!("{index}: {line}");
        }
    } else if let Some(size) = request.size {
        let count = usize::try_from(size).map_err(|_| {
            rafile::RandomAccessError::InvalidArgument(format!("size {size} is too large"))
        })?;
        let bytes = file.read_bytes(count)?;
        if (bytes.len() as u64) < size {
            info!("Short read: {} of {} bytes", bytes.len(), size);
        }
        println!("{}", String::from_utf8_lossy(&bytes));
    }

    file.close()
}

fn main() {
    let matches = Command::new("rafile")
        .version(crate_version!())
        .about("Read and write a file at arbitrary offsets.")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_parser(value_parser!(String))
                .required(true)
                .help("The path to the file."),
        )
        .arg(
            Arg::new("offset")
                .short('o')
                .long("offset")
                .value_parser(maybe_hex::<u64>)
                .required(false)
                .help("Byte offset to start at (decimal or 0x-prefixed hex)."),
        )
        .arg(
            Arg::new("size")
                .short('s')
                .long("size")
                .value_parser(maybe_hex::<u64>)
                .required(false)
                .help("The size (in bytes) to read."),
        )
        .arg(
            Arg::new("lines")
                .long("lines")
                .action(ArgAction::SetTrue)
                .conflicts_with("size")
                .help("Print every remaining line with its index."),
        )
        .arg(
            Arg::new("write")
                .short('w')
                .long("write")
                .value_parser(value_parser!(String))
                .required(false)
                .help("Text to write at the offset."),
        )
        .arg(
            Arg::new("write_line")
                .long("write-line")
                .action(ArgAction::SetTrue)
                .requires("write")
                .help("Append the platform newline to the written text."),
        )
        .arg(
            Arg::new("create")
                .long("create")
                .action(ArgAction::SetTrue)
                .help("Create the file if it does not exist."),
        )
        .arg(
            Arg::new("log_level")
                .short('l')
                .long("log-level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .help("Set the log verbosity level"),
        )
        .get_matches();

    let level_filter = match matches.get_one::<String>("log_level").map(String::as_str) {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new().filter_level(level_filter).init();

    let Some(path) = matches.get_one::<String>("file") else {
        error!("Missing --file");
        std::process::exit(1);
    };
    let options = Options::new().create(matches.get_flag("create"));
    let request = Request {
        offset: matches.get_one::<u64>("offset").copied().unwrap_or(0),
        size: matches.get_one::<u64>("size").copied(),
        lines: matches.get_flag("lines"),
        write: matches.get_one::<String>("write").map(String::as_str),
        newline: matches.get_flag("write_line"),
    };

    if let Err(err) = run(path, options, request) {
        error!("{err}");
        std::process::exit(1);
    }
}
