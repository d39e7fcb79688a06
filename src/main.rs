//! Command-line driver: load an edge list, run the search, print one result
//! record to stdout and optionally dump the solution to a file.

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;

use rand::SeedableRng;
use rand_pcg::Pcg64Dxsm;

use clusterga::graph::{load_graph_file, GraphIndex};
use clusterga::problem::ProblemKind;
use clusterga::search::{run, GaConfig};

struct Options {
    input: String,
    k: usize,
    kind: ProblemKind,
    cutoff: u64,
    save: Option<String>,
    seed: Option<u64>,
    report_every: u64,
}

fn usage(program: &str) -> ! {
    eprintln!("usage: {program} --input FILE --k K --type cd|cvd [OPTIONS]");
    eprintln!();
    eprintln!("  --input FILE     plaintext edge list (one 'u v' pair per line)");
    eprintln!("  --k K            deletion budget");
    eprintln!("  --type cd|cvd    delete edges (cd) or vertices (cvd)");
    eprintln!("  --cutoff N       generation limit (default 1000000)");
    eprintln!("  --save FILE      write the solution here if one is found");
    eprintln!("  --seed S         seed the generator (default: from entropy)");
    eprintln!("  --progress N     report every N generations (default: silent)");
    process::exit(2);
}

fn next_value(args: &mut env::Args, flag: &str, program: &str) -> String {
    args.next().unwrap_or_else(|| {
        eprintln!("{program}: {flag} needs a value");
        usage(program);
    })
}

fn parse_options() -> Options {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "clusterga".into());

    let mut input = None;
    let mut k = None;
    let mut kind = None;
    let mut cutoff = 1_000_000u64;
    let mut save = None;
    let mut seed = None;
    let mut report_every = 0u64;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--input" | "-i" => input = Some(next_value(&mut args, &flag, &program)),
            "--k" | "-k" => {
                let v = next_value(&mut args, &flag, &program);
                k = Some(v.parse().unwrap_or_else(|_| {
                    eprintln!("{program}: invalid budget {v:?}");
                    usage(&program)
                }));
            }
            "--type" | "-t" => {
                let v = next_value(&mut args, &flag, &program);
                kind = Some(ProblemKind::parse(&v).unwrap_or_else(|| {
                    eprintln!("{program}: unknown problem type {v:?} (expected cd or cvd)");
                    usage(&program)
                }));
            }
            "--cutoff" | "-c" => {
                let v = next_value(&mut args, &flag, &program);
                cutoff = v.parse().unwrap_or_else(|_| {
                    eprintln!("{program}: invalid cutoff {v:?}");
                    usage(&program)
                });
            }
            "--save" | "-o" => save = Some(next_value(&mut args, &flag, &program)),
            "--seed" | "-s" => {
                let v = next_value(&mut args, &flag, &program);
                seed = Some(v.parse().unwrap_or_else(|_| {
                    eprintln!("{program}: invalid seed {v:?}");
                    usage(&program)
                }));
            }
            "--progress" => {
                let v = next_value(&mut args, &flag, &program);
                report_every = v.parse().unwrap_or_else(|_| {
                    eprintln!("{program}: invalid progress interval {v:?}");
                    usage(&program)
                });
            }
            "--help" | "-h" => usage(&program),
            other => {
                eprintln!("{program}: unknown argument {other:?}");
                usage(&program);
            }
        }
    }

    let (Some(input), Some(k), Some(kind)) = (input, k, kind) else {
        eprintln!("{program}: --input, --k and --type are required");
        usage(&program);
    };
    Options {
        input,
        k,
        kind,
        cutoff,
        save,
        seed,
        report_every,
    }
}

fn main() {
    let opts = parse_options();

    let loaded = match load_graph_file(&opts.input) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("cannot load {}: {e}", opts.input);
            process::exit(1);
        }
    };
    eprintln!(
        "loaded {} with {} vertices and {} edges",
        opts.input,
        loaded.n,
        loaded.edges.len()
    );

    let graph = GraphIndex::build(loaded.n, &loaded.edges, opts.k);
    let seed = opts.seed.unwrap_or_else(rand::random);
    eprintln!(
        "solving {} with k = {}, cutoff {}, seed {seed}",
        opts.kind, opts.k, opts.cutoff
    );

    let cfg = GaConfig {
        kind: opts.kind,
        cutoff: opts.cutoff,
        report_every: opts.report_every,
        ..GaConfig::default()
    };
    let mut rng = Pcg64Dxsm::seed_from_u64(seed);
    let outcome = run(&graph, &cfg, &mut rng);

    println!("{}", outcome.csv_line(&opts.input));

    if outcome.solved {
        eprintln!(
            "solved after {} generations, {} deletions",
            outcome.generations,
            outcome.solution().map_or(0, |s| s.len())
        );
        if let Some(path) = &opts.save {
            let file = match File::create(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("cannot write {path}: {e}");
                    process::exit(1);
                }
            };
            let mut w = BufWriter::new(file);
            if let Err(e) = outcome.write_solution(&graph, &mut w) {
                eprintln!("cannot write {path}: {e}");
                process::exit(1);
            }
            eprintln!("solution written to {path}");
        }
    } else {
        eprintln!(
            "cutoff reached after {} generations with {} chromosomes left",
            outcome.generations, outcome.population_size
        );
    }
}
