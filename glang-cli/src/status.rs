use colored::*;

pub enum Kind {
    Info,
    Warn,
    Fatal,
}

/// A tagged status line on stderr, so tool chatter never mixes into
/// a program's stdout.
pub struct Status(pub Kind, pub &'static str);

impl Status {
    pub fn info() -> Status {
        Status(Kind::Info, "Info")
    }
    pub fn warn() -> Status {
        Status(Kind::Warn, "Warning")
    }
    pub fn fatal() -> Status {
        Status(Kind::Fatal, "Fatal")
    }

    fn tag(&self) -> ColoredString {
        match self.0 {
            Kind::Info => self.1.blue(),
            Kind::Warn => self.1.yellow(),
            Kind::Fatal => self.1.red(),
        }
        .bold()
    }

    pub fn log(&self, message: &str) {
        let lines = message.lines().collect::<Vec<&str>>();

        match lines.len() {
            0 | 1 => eprintln!("{:>7} {}", self.tag(), message),
            _ => {
                eprintln!("{}:", self.tag());
                for line in lines {
                    eprintln!("{}", line);
                }
            },
        }
    }
}
