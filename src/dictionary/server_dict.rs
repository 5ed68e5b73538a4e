use crate::dictionary::candidate::DictionaryCandidate;
use crate::dictionary::dictentry::DictEntry;
use crate::dictionary::file_dictionary::{decode_string, encode_string, encoding_from_label};
use crate::dictionary::Dictionary;
use crate::error::SkkError;
use encoding_rs::Encoding;
use log::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;

const VERSION_REPLY_BUF_SIZE: usize = 1024;

///
/// skkserv client.
///
/// A failed request closes the connection and it stays closed until [Dictionary::reload].
///
#[derive(Debug)]
pub(crate) struct ServerDictionary {
    host: String,
    port: u16,
    encoding: &'static Encoding,
    stream: Option<TcpStream>,
}

impl ServerDictionary {
    /// Fails only on unknown encoding. A server that can't be reached is an empty dictionary.
    pub(crate) fn new(host: &str, port: u16, encode: &str) -> Result<Self, SkkError> {
        let encoding = encoding_from_label(encode)?;
        let mut dictionary = ServerDictionary {
            host: host.to_owned(),
            port,
            encoding,
            stream: None,
        };
        dictionary.connect();
        Ok(dictionary)
    }

    fn connect(&mut self) {
        self.disconnect();
        match TcpStream::connect((self.host.as_str(), self.port))
            .map_err(SkkError::from)
            .and_then(|mut stream| ServerDictionary::handshake(&mut stream).map(|_| stream))
        {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => warn!("Failed to connect to {}:{}: {}", self.host, self.port, e),
        }
    }

    fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.write_all(b"0");
        }
    }

    fn handshake(stream: &mut TcpStream) -> Result<(), SkkError> {
        stream.write_all(b"2")?;
        let mut buf = [0u8; VERSION_REPLY_BUF_SIZE];
        let read = stream.read(&mut buf)?;
        if read == 0 {
            return Err(SkkError::Error("Empty reply for version".to_string()));
        }
        debug!("skkserv version: {}", String::from_utf8_lossy(&buf[..read]).trim());
        Ok(())
    }

    /// Slash delimited candidates on hit.
    fn request(&mut self, encoded_midasi: &[u8]) -> Result<Option<Vec<u8>>, SkkError> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(None),
        };
        let mut request = Vec::with_capacity(encoded_midasi.len() + 2);
        request.push(b'1');
        request.extend_from_slice(encoded_midasi);
        request.push(b' ');
        stream.write_all(&request)?;

        let mut reply = Vec::new();
        BufReader::new(&*stream).read_until(b'\n', &mut reply)?;
        match reply.first() {
            None => Err(SkkError::Error("Connection closed by server".to_string())),
            Some(b'1') => Ok(Some(reply[1..].to_vec())),
            Some(_) => Ok(None),
        }
    }
}

impl Dictionary for ServerDictionary {
    fn lookup(&mut self, midasi: &str, _okuri: bool) -> Vec<DictionaryCandidate> {
        let encoded = match encode_string(self.encoding, midasi) {
            Ok(encoded) => encoded,
            Err(_) => return vec![],
        };
        let reply = match self.request(&encoded) {
            Ok(Some(reply)) => reply,
            Ok(None) => return vec![],
            Err(e) => {
                warn!("skkserv request failed: {}. Closing connection.", e);
                self.stream = None;
                return vec![];
            }
        };
        let line = match decode_string(self.encoding, &reply) {
            Some(candidates) => format!("{} {}", midasi, candidates.trim_end()),
            None => {
                warn!("Ill encoded reply for {}", midasi);
                return vec![];
            }
        };
        match DictEntry::from_skkjisyo_line(&line) {
            Ok(entry) => entry.candidates,
            Err(e) => {
                warn!("Ignored reply: {}", e);
                vec![]
            }
        }
    }

    /// Reconnects.
    fn reload(&mut self) -> Result<(), SkkError> {
        self.connect();
        Ok(())
    }
}

impl Drop for ServerDictionary {
    fn drop(&mut self) {
        self.disconnect();
    }
}
