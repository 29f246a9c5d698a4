use std::sync::mpsc::channel;

use nanolog::{Level, logger_config};

fn main() {
    let path = logger_config()
        .with_level(Level::Debug)
        .init_global("/tmp/nanolog_example")
        .expect("Unable to create log file");
    nanolog::info("Hello, world!");
    let (handles, senders): (Vec<_>, Vec<_>) = (0..5)
        .map(|i| {
            let (sender, receiver) = channel::<&'static str>();
            (
                std::thread::spawn(move || {
                    for message in receiver {
                        nanolog::debug(format!("thread {i} received: {message}"));
                    }
                    let err = std::io::Error::other(format!("thread {i} is done"));
                    nanolog::warn_with_trace(&err);
                }),
                sender,
            )
        })
        .unzip();
    for sender in &senders {
        sender.send("Hello, world!").unwrap();
    }
    drop(senders);
    for handle in handles {
        handle.join().unwrap();
    }
    nanolog::close();
    let content = std::fs::read_to_string(&path).unwrap();
    println!("{} lines written to {}", content.lines().count(), path.display());
    println!("first line: {}", content.lines().next().unwrap_or_default());
}
