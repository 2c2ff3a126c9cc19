//! Registry failures with their fixed wording.

use rendezvous_core::Status;

pub fn client_not_registered() -> Status {
    Status::not_found("Client isn't registered yet.")
}

pub fn node_not_registered(node: &str) -> Status {
    Status::not_found(format!("Node '{node}' isn't registered yet."))
}

pub fn node_already_registered(node: &str) -> Status {
    Status::already_exists(format!("Node '{node}' is already registered."))
}

pub fn topic_already_published(topic: &str) -> Status {
    Status::already_exists(format!("Topic '{topic}' is already being published."))
}

pub fn topic_not_published(node: &str, topic: &str) -> Status {
    Status::not_found(format!("Node '{node}' isn't publishing topic '{topic}'."))
}

pub fn topic_already_subscribed(node: &str, topic: &str) -> Status {
    Status::already_exists(format!(
        "Node '{node}' is already subscribing topic '{topic}'."
    ))
}

pub fn topic_not_subscribed(node: &str, topic: &str) -> Status {
    Status::not_found(format!("Node '{node}' isn't subscribing topic '{topic}'."))
}

pub fn service_already_served(service: &str) -> Status {
    Status::already_exists(format!("Service '{service}' is already being served."))
}

pub fn service_not_served(node: &str, service: &str) -> Status {
    Status::not_found(format!("Node '{node}' isn't serving service '{service}'."))
}

pub fn service_already_requested(node: &str, service: &str) -> Status {
    Status::already_exists(format!(
        "Node '{node}' is already requesting service '{service}'."
    ))
}

pub fn service_not_requested(node: &str, service: &str) -> Status {
    Status::not_found(format!("Node '{node}' isn't requesting service '{service}'."))
}

pub fn empty_name(what: &str) -> Status {
    Status::invalid_argument(format!("{what} name is empty."))
}
