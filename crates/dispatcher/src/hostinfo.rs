//! Local host information for the database sink
//!
//! The `dhtdata` table records the relay host's IP and a 14-digit local
//! timestamp alongside each event; neither comes from the wire payload.

use std::net::UdpSocket;

/// Local IP of the default route, `127.0.0.1` when it cannot be determined.
///
/// Uses the UDP-connect trick: no packet is sent, the socket only resolves
/// which interface would carry one.
pub fn local_ip() -> String {
    let resolved = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
        socket.connect(("10.255.255.255", 1))?;
        socket.local_addr()
    });

    match resolved {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => "127.0.0.1".to_string(),
    }
}

/// Current local time as a 14-digit `YYYYMMDDHHMMSS` string.
pub fn systime() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}
