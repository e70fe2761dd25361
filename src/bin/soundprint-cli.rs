use std::process;
use std::thread;
use std::time::Duration;

use clap::{App, Arg, SubCommand};
use soundprint::{Config, MatchOutput, OutputFormat, SoundPrint};

fn main() {
    let matches = App::new("SoundPrint CLI")
        .version(soundprint::VERSION)
        .about("Landmark-pair acoustic fingerprinting with a local SQLite index")
        .subcommand(
            SubCommand::with_name("enroll")
                .about("Fingerprint a WAV file and add it to the index")
                .arg(
                    Arg::with_name("input")
                        .required(true)
                        .help("Input WAV file path (44.1 kHz, 16-bit PCM)")
                        .index(1)
                )
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Song name to store (defaults to the file path)")
                        .takes_value(true)
                )
                .arg(database_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("identify")
                .about("Identify a WAV clip against the local index")
                .arg(
                    Arg::with_name("input")
                        .required(true)
                        .help("Query WAV file path")
                        .index(1)
                )
                .arg(
                    Arg::with_name("raw")
                        .long("raw")
                        .help("Treat the input as a raw spectrogram file instead of WAV")
                )
                .arg(format_arg())
                .arg(database_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("listen")
                .about("Capture live audio for a while, then identify it")
                .arg(
                    Arg::with_name("device")
                        .short("d")
                        .long("device")
                        .value_name("DEVICE")
                        .help("Audio input device name")
                        .takes_value(true)
                )
                .arg(
                    Arg::with_name("seconds")
                        .short("s")
                        .long("seconds")
                        .value_name("SECONDS")
                        .help("How long to capture")
                        .takes_value(true)
                        .default_value("10")
                )
                .arg(format_arg())
                .arg(database_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("devices")
                .about("List available audio input devices")
        )
        .subcommand(
            SubCommand::with_name("upload")
                .about("Upload the next pending song's fingerprint to the remote service")
                .arg(database_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Identify a WAV clip via the remote service")
                .arg(
                    Arg::with_name("input")
                        .required(true)
                        .help("Query WAV file path")
                        .index(1)
                )
                .arg(database_arg())
                .arg(verbose_arg())
        )
        .get_matches();

    match matches.subcommand() {
        ("enroll", Some(sub_matches)) => {
            let input_file = sub_matches.value_of("input").unwrap();
            let name = sub_matches.value_of("name").unwrap_or(input_file);

            let mut engine = open_engine(sub_matches);
            match engine.enroll_from_wav(input_file, name) {
                Ok(song_id) => {
                    println!("Enrolled '{}' as song {}", name, song_id);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("identify", Some(sub_matches)) => {
            let input_file = sub_matches.value_of("input").unwrap();
            let format = parse_format(sub_matches.value_of("format").unwrap());

            let engine = open_engine(sub_matches);
            let results = if sub_matches.is_present("raw") {
                engine.identify_from_spectrogram_file(input_file)
            } else {
                engine.identify_from_wav(input_file)
            };
            match results {
                Ok(results) => print_results(&results, format),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("listen", Some(sub_matches)) => {
            let device = sub_matches.value_of("device").map(|s| s.to_string());
            let seconds: u64 = match sub_matches.value_of("seconds").unwrap().parse() {
                Ok(seconds) => seconds,
                Err(_) => {
                    eprintln!("Error: --seconds must be a whole number");
                    process::exit(1);
                }
            };
            let format = parse_format(sub_matches.value_of("format").unwrap());
            let verbose = sub_matches.is_present("verbose");

            let engine = open_engine(sub_matches);
            let session = match engine.start_capture(device) {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("Error starting capture: {}", e);
                    process::exit(1);
                }
            };

            if verbose {
                println!("Capturing for {} seconds...", seconds);
            }
            thread::sleep(Duration::from_secs(seconds));
            let spectrogram = session.stop();

            let results = engine
                .landmarks_from_spectrogram(&spectrogram)
                .and_then(|landmarks| engine.identify_landmark_list(&landmarks));
            match results {
                Ok(results) => print_results(&results, format),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("devices", Some(_)) => {
            match soundprint::audio::AudioRecorder::list_input_devices() {
                Ok(devices) => {
                    println!("Available audio input devices:");
                    for (i, device) in devices.iter().enumerate() {
                        println!("  {}: {}", i, device);
                    }
                }
                Err(e) => {
                    eprintln!("Error listing devices: {}", e);
                    process::exit(1);
                }
            }
        }
        ("upload", Some(sub_matches)) => {
            let mut engine = open_engine(sub_matches);
            match engine.upload_next_song() {
                Ok(Some(song_id)) => println!("Uploaded song {}", song_id),
                Ok(None) => println!("Nothing left to upload"),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("search", Some(sub_matches)) => {
            let input_file = sub_matches.value_of("input").unwrap();

            let engine = open_engine(sub_matches);
            let results = soundprint::audio::read_wav_samples(input_file)
                .and_then(|samples| {
                    engine.landmarks_from_samples(&samples, soundprint::audio::framer::BATCH_FRAME_SAMPLES)
                })
                .and_then(|landmarks| engine.search_by_service(&landmarks));
            match results {
                Ok(matches) => {
                    if matches.is_empty() {
                        println!("No matches from service");
                    }
                    for entry in matches {
                        println!("{} (song {}, count {})", entry.filename, entry.song_id, entry.count);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            // No output for unknown subcommands
        }
    }
}

fn database_arg() -> Arg<'static, 'static> {
    Arg::with_name("database")
        .long("database")
        .value_name("PATH")
        .help("Path of the fingerprint index database")
        .takes_value(true)
}

fn format_arg() -> Arg<'static, 'static> {
    Arg::with_name("format")
        .short("f")
        .long("format")
        .value_name("FORMAT")
        .help("Output format: simple, json, csv")
        .takes_value(true)
        .default_value("simple")
}

fn verbose_arg() -> Arg<'static, 'static> {
    Arg::with_name("verbose")
        .short("v")
        .long("verbose")
        .help("Enable verbose debug output")
}

fn parse_format(format_str: &str) -> OutputFormat {
    match format_str {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        _ => OutputFormat::Simple,
    }
}

fn open_engine(sub_matches: &clap::ArgMatches) -> SoundPrint {
    let verbose = sub_matches.is_present("verbose");
    let mut config = Config::default().with_quiet_mode(!verbose);
    if let Some(path) = sub_matches.value_of("database") {
        config = config.with_database_path(path);
    }

    match SoundPrint::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error opening index: {}", e);
            process::exit(1);
        }
    }
}

fn print_results(results: &[soundprint::Identification], format: OutputFormat) {
    if results.is_empty() {
        println!("No match found");
        return;
    }
    if format == OutputFormat::Csv {
        println!("{}", MatchOutput::csv_header());
    }
    for result in results {
        let output = MatchOutput::format_result(result, format);
        println!("{}", output);
    }
}
