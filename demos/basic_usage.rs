//! Basic usage example for the smtp-mock server
//!
//! Starts a mock server with a blacklisted sender, talks to it with a
//! minimal hand-written client, then prints what the server recorded.

use smtp_mock::{Configuration, Server};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("smtp-mock Basic Usage Example");
    println!("=============================");

    let server = Server::new(Configuration {
        blacklisted_mailfrom_emails: vec!["spammer@example.com".to_owned()],
        log_to_stdout: true,
        log_server_activity: true,
        ..Default::default()
    });
    server.start().await?;
    println!("Server started on 127.0.0.1:{}", server.port_number());

    println!("\nSending test email...");
    send_test_email(server.port_number()).await?;

    server.stop().await?;

    println!("\nRecorded messages:");
    for (n, message) in server.messages().iter().enumerate() {
        println!(
            "  #{} helo: {:?} mailfrom: {} rcptto: {} data: {} msg: {}",
            n + 1,
            message.helo_domain(),
            message.mailfrom(),
            message.rcptto(),
            message.data(),
            message.msg()
        );
    }

    if let Some(message) = server.messages().iter().rev().find(|m| m.is_consistent()) {
        println!("\nLast complete message:");
        println!("  Subject: {:?}", message.subject());
        for line in message.msg_request().lines() {
            println!("    {line}");
        }
    }

    Ok(())
}

async fn send_test_email(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(("127.0.0.1", port)).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    println!("S: {}", line.trim());

    for command in [
        "HELO client.example.com",
        "MAIL FROM:<spammer@example.com>",
        "MAIL FROM:<sender@example.com>",
        "RCPT TO:<recipient@example.com>",
        "DATA",
        "Subject: Test Email\r\n\r\nThis is a test email.\r\n.",
        "QUIT",
    ] {
        println!("C: {}", command.lines().next().unwrap_or_default());
        writer.write_all(format!("{command}\r\n").as_bytes()).await?;

        line.clear();
        reader.read_line(&mut line).await?;
        println!("S: {}", line.trim());
    }

    Ok(())
}
