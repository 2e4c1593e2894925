use smtp_mock::{Configuration, Server, logging};
use std::env;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let host_address = if args.len() > 1 {
        args[1].clone()
    } else {
        smtp_mock::config::HOST_ADDRESS.to_owned()
    };

    let port_number = if args.len() > 2 {
        match args[2].parse::<u16>() {
            Ok(port) => port,
            Err(e) => {
                eprintln!("Invalid port {}: {e}", args[2]);
                std::process::exit(2);
            }
        }
    } else {
        2525
    };

    logging::init();

    let server = Server::new(Configuration {
        host_address,
        port_number,
        log_server_activity: true,
        ..Default::default()
    });

    if let Err(e) = server.start().await {
        eprintln!("Failed to start server: {e}");
        std::process::exit(1);
    }

    println!(
        "smtp-mock listening on {}:{}, press Ctrl-C to stop",
        server.configuration().host_address,
        server.port_number()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Unable to listen for shutdown signal: {e}");
    }

    if let Err(e) = server.stop().await {
        eprintln!("Failed to stop server: {e}");
    }

    let messages = server.messages();
    let consistent = messages.iter().filter(|m| m.is_consistent()).count();
    println!(
        "Recorded {} message snapshots, {consistent} consistent",
        messages.len()
    );

    for (count, message) in messages.iter().filter(|m| m.is_consistent()).enumerate() {
        println!(
            "Message #{} from: {:?} helo: {:?}",
            count + 1,
            message.mailfrom_request(),
            message.helo_domain()
        );
        if let Some(subject) = message.subject() {
            println!("  Subject: {subject}");
        }
    }
}
