// Copyright 2022 Paolo Galeone <nessuno@nerdz.eu>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::sync::Arc;

use dirpush::config::Config;
use dirpush::logging;
use dirpush::observer::{LogObserver, Observer};
use dirpush::run;

use log::*;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt()]
struct Opt {
    /// Only errors on the console (the log file is still written)
    #[structopt(short = "q", long = "quiet")]
    quiet: bool,
    /// Verbose mode (-v, -vv, -vvv, etc)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,
    /// Directory to upload
    #[structopt(parse(from_os_str))]
    dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), i32> {
    let opt = Opt::from_args();

    let config = Config::from_env();
    let log_file = match &config {
        Ok(config) => config.log_file.clone(),
        Err(_) => Config::default().log_file,
    };
    if let Err(error) = logging::init(&log_file, logging::console_level(opt.quiet, opt.verbose)) {
        eprintln!("{}", error);
        return Err(-1);
    }

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            error!("Config error: {}", error);
            return Err(-1);
        }
    };

    let backend = match run::backend(&config) {
        Ok(backend) => backend,
        Err(error) => {
            error!("Invalid localhost remote: {}", error);
            return Err(-1);
        }
    };

    let observer: Arc<dyn Observer> = Arc::new(LogObserver);
    match run::run(opt.dir.as_deref(), &config, backend.as_ref(), observer).await {
        Ok(()) => Ok(()),
        // Already reported by the observer
        Err(run::Error::Input(_)) => Err(-1),
        Err(error) => {
            error!("{}", error);
            Err(-1)
        }
    }
}
