//! CLI for the specialized K_6 witness finder.

use std::fs::File;
use std::io::BufReader;

use clap::{crate_version, App, Arg};

fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));
	let matches = App::new("k6-engine")
		.version(crate_version!())
		.about("Enumerates K_6 minor witnesses given a width-6 path decomposition")
		.arg(Arg::with_name("input-file").long("input-file").short("i").takes_value(true).required(true).help("NODE/EDGE graph file"))
		.arg(
			Arg::with_name("decomp-file")
				.long("decomp-file")
				.short("d")
				.takes_value(true)
				.required(true)
				.help("INTRODUCE_NODE/INTRODUCE_EDGE/FORGET_NODE path decomposition file"),
		)
		.arg(Arg::with_name("output-file").long("output-file").short("o").takes_value(true).required(true).help("Output MINOR records"))
		.arg(
			Arg::with_name("frontier-limit")
				.long("frontier-limit")
				.takes_value(true)
				.default_value("10000000")
				.validator(|s| s.parse::<usize>().map(|_| ()).map_err(|e| e.to_string()))
				.help("Abort once the partial-state frontier exceeds this many states"),
		)
		.get_matches();

	let input_path = matches.value_of("input-file").unwrap();
	let decomp_path = matches.value_of("decomp-file").unwrap();
	let output_path = matches.value_of("output-file").unwrap();
	let frontier_limit: usize = matches.value_of("frontier-limit").unwrap().parse().expect("validated by clap");

	log::info!("reading graph from {}", input_path);
	let input = File::open(input_path).unwrap_or_else(|e| panic!("cannot open {}: {}", input_path, e));
	let g = minorfinder::io::read_graph(input_path, BufReader::new(input)).unwrap_or_else(|e| panic!("{}", e));

	log::info!("reading path decomposition from {}", decomp_path);
	let decomp_file = File::open(decomp_path).unwrap_or_else(|e| panic!("cannot open {}: {}", decomp_path, e));
	let pd = minorfinder::io::read_path_decomp(decomp_path, BufReader::new(decomp_file)).unwrap_or_else(|e| panic!("{}", e));
	let width = pd.width();
	if width > 6 {
		log::warn!("decomposition width {} exceeds 6; no K_6 witness can use every branch", width);
	}

	log::info!("searching for K_6 witnesses");
	let found = minorfinder::engine::k6::solve(&g, &pd, frontier_limit).unwrap_or_else(|e| panic!("{}", e));
	log::info!("found {} witnesses", found.len());

	let output = File::create(output_path).unwrap_or_else(|e| panic!("cannot create {}: {}", output_path, e));
	minorfinder::io::write_minors(output, &g, &found)
}
