use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use xml::reader::Error as XmlReadError;
use xml::writer::Error as XmlWriteError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// The request never produced an HTTP response (DNS, TLS, connection reset...).
    Http(Box<ureq::Error>),
    /// The API answered with a status above 299. `message` is the raw body.
    Api { status: u16, message: String },
    XmlRead(XmlReadError),
    XmlWrite(XmlWriteError),
    /// An element declared a `type` attribute outside the known vocabulary.
    UnknownType(String),
    InvalidValue { kind: &'static str, text: String },
    UnexpectedDocument { expected: &'static str },
    Config(String),
}

impl Error {
    /// HTTP status of an API error, `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match *self {
            Error::Api { status, .. } => Some(status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => fmt::Display::fmt(err, f),
            Error::Http(ref err) => fmt::Display::fmt(err, f),
            Error::Api { status, ref message } => write!(f, "{}, {}", status, message),
            Error::XmlRead(ref err) => fmt::Display::fmt(err, f),
            Error::XmlWrite(ref err) => fmt::Display::fmt(err, f),
            Error::UnknownType(ref name) => write!(f, "unknown element type '{}'", name),
            Error::InvalidValue { kind, ref text } => {
                write!(f, "invalid {} value '{}'", kind, text)
            }
            Error::UnexpectedDocument { expected } => {
                write!(f, "unexpected document, expected {}", expected)
            }
            Error::Config(ref msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Http(ref err) => Some(err.as_ref()),
            Error::XmlRead(ref err) => Some(err),
            Error::XmlWrite(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Error {
        Error::Http(Box::new(err))
    }
}

impl From<XmlReadError> for Error {
    fn from(err: XmlReadError) -> Error {
        Error::XmlRead(err)
    }
}

impl From<XmlWriteError> for Error {
    fn from(err: XmlWriteError) -> Error {
        Error::XmlWrite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api { status: 422, message: "Validation failed".into() };

        assert_eq!("422, Validation failed", err.to_string());
        assert_eq!(Some(422), err.status());
    }

    #[test]
    fn test_status_only_for_api_errors() {
        let err = Error::UnknownType("money".into());

        assert_eq!(None, err.status());
        assert_eq!("unknown element type 'money'", err.to_string());
    }
}
