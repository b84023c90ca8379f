//! Telnet IAC filtering for line-mode MUD clients.
//!
//! Raw telnet clients open with option negotiation. We never agree to any option:
//! - `IAC DO <opt>`   => `IAC WONT <opt>`
//! - `IAC WILL <opt>` => `IAC DONT <opt>`
//!
//! Subnegotiation blocks (`IAC SB ... IAC SE`) are dropped whole.

use bytes::BufMut;
use bytes::BytesMut;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Data,
    Iac,
    Negotiate(u8),
    Subneg,
    SubnegIac,
}

#[derive(Debug, Default)]
pub struct IacFilter {
    state: State,
}

impl IacFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `chunk`, appending plain data to `data` and negotiation refusals to `replies`.
    ///
    /// State carries across calls, so a sequence split between two reads is handled.
    pub fn feed(&mut self, chunk: &[u8], data: &mut BytesMut, replies: &mut BytesMut) {
        for &b in chunk {
            self.state = match self.state {
                State::Data if b == IAC => State::Iac,
                State::Data => {
                    data.put_u8(b);
                    State::Data
                }
                State::Iac => match b {
                    // Escaped 0xff.
                    IAC => {
                        data.put_u8(IAC);
                        State::Data
                    }
                    DO | DONT | WILL | WONT => State::Negotiate(b),
                    SB => State::Subneg,
                    // NOP, GA, AYT and friends carry no option byte.
                    _ => State::Data,
                },
                State::Negotiate(cmd) => {
                    match cmd {
                        DO => replies.put_slice(&[IAC, WONT, b]),
                        WILL => replies.put_slice(&[IAC, DONT, b]),
                        _ => {}
                    }
                    State::Data
                }
                State::Subneg if b == IAC => State::SubnegIac,
                State::Subneg => State::Subneg,
                State::SubnegIac if b == SE => State::Data,
                State::SubnegIac => State::Subneg,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(f: &mut IacFilter, chunk: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut d = BytesMut::new();
        let mut r = BytesMut::new();
        f.feed(chunk, &mut d, &mut r);
        (d.to_vec(), r.to_vec())
    }

    #[test]
    fn plain_text_is_untouched() {
        let mut f = IacFilter::new();
        let (d, r) = run(&mut f, b"look\r\n");
        assert_eq!(d, b"look\r\n");
        assert!(r.is_empty());
    }

    #[test]
    fn refuses_do_and_will() {
        let mut f = IacFilter::new();
        // IAC DO ECHO, IAC WILL NAWS, then "n"
        let (d, r) = run(&mut f, &[255, 253, 1, 255, 251, 31, b'n']);
        assert_eq!(d, b"n");
        assert_eq!(r, vec![255, 252, 1, 255, 254, 31]);
    }

    #[test]
    fn negotiation_split_across_reads() {
        let mut f = IacFilter::new();
        let (d1, r1) = run(&mut f, &[b'g', 255]);
        assert_eq!(d1, b"g");
        assert!(r1.is_empty());

        let (d2, r2) = run(&mut f, &[253, 24, b'o']);
        assert_eq!(d2, b"o");
        assert_eq!(r2, vec![255, 252, 24]);
    }

    #[test]
    fn drops_subnegotiation_block() {
        let mut f = IacFilter::new();
        let (d, r) = run(&mut f, &[b'a', 255, 250, 24, 0, b'x', 255, 240, b'b']);
        assert_eq!(d, b"ab");
        assert!(r.is_empty());
    }

    #[test]
    fn escaped_iac_is_data() {
        let mut f = IacFilter::new();
        let (d, _) = run(&mut f, &[255, 255]);
        assert_eq!(d, vec![255]);
    }
}
