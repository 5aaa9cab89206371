use std::fmt;
use std::io;

/// Step of the transmission that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitStage {
    Bind,
    EnableBroadcast,
    Send,
    ShortWrite,
}

impl fmt::Display for TransmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransmitStage::Bind => "could not create socket",
            TransmitStage::EnableBroadcast => "could not enable broadcast",
            TransmitStage::Send => "send failed",
            TransmitStage::ShortWrite => "datagram truncated",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WolError {
    #[error("invalid MAC address '{0}', expected XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX")]
    InvalidMacFormat(String),
    #[error("destination address is empty")]
    EmptyDestination,
    #[error("could not resolve destination '{destination}'")]
    AddressResolutionFailed {
        destination: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("transmission failed: {stage}")]
    TransmissionFailed {
        stage: TransmitStage,
        #[source]
        source: io::Error,
    },
}

impl WolError {
    pub(crate) fn transmit(stage: TransmitStage) -> impl FnOnce(io::Error) -> WolError {
        move |source| WolError::TransmissionFailed { stage, source }
    }
}
