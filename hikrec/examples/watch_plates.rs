//! Print recognitions from a camera as JSON lines
//!
//! ```text
//! HIKREC_LOG_MODE=development cargo run --example watch_plates -- \
//!     http://192.168.1.64/onvif/event_service admin secret
//! ```

use std::env;
use std::process;

use hikrec::logging::init_logging_from_env;
use hikrec::prelude::*;

fn main() {
    if let Err(e) = init_logging_from_env() {
        eprintln!("logging disabled: {}", e);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let [address, username, password] = args.as_slice() else {
        eprintln!("usage: watch_plates <event-service-url> <username> <password>");
        process::exit(2);
    };

    let device = match DeviceEndpoint::new(address.as_str(), username.as_str(), password.as_str()) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let stream = match start_recognition_stream(device) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    for recognition in stream {
        match serde_json::to_string(&recognition.identify()) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("failed to encode recognition: {}", e),
        }
    }
}
