pub mod duplex;
pub mod grpc;
pub mod session;
pub mod state_machine;

pub mod greet_proto {
    include!(concat!(env!("OUT_DIR"), "/greet.rs"));
}
