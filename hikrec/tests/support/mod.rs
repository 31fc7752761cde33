//! Scripted in-memory camera for stream tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use soap_client::{HttpRequest, SoapError, Transport};

pub const CREATE_ACTION: &str =
    "http://www.onvif.org/ver10/events/wsdl/EventPortType/CreatePullPointSubscriptionRequest";
pub const PULL_ACTION: &str =
    "http://www.onvif.org/ver10/events/wsdl/PullPointSubscription/PullMessagesRequest";
pub const UNSUBSCRIBE_ACTION: &str =
    "http://docs.oasis-open.org/wsn/bw-2/SubscriptionManager/UnsubscribeRequest";

/// Scripted reply for one exchange
#[derive(Debug, Clone)]
pub enum Reply {
    /// SOAP body content, wrapped in an envelope
    Body(String),
    /// Transport failure
    Fail,
}

/// Camera double that answers from per-operation queues
///
/// Empty create queue answers with a fresh subscription; empty pull queue
/// sleeps briefly and answers with no messages.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    creates: Mutex<VecDeque<Reply>>,
    pulls: Mutex<VecDeque<Reply>>,
    create_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    pull_urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, reply: Reply) -> &Self {
        self.creates.lock().push_back(reply);
        self
    }

    pub fn push_pull(&self, reply: Reply) -> &Self {
        self.pulls.lock().push_back(reply);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn pull_urls(&self) -> Vec<String> {
        self.pull_urls.lock().clone()
    }

    fn answer(&self, reply: Reply) -> Result<String, SoapError> {
        match reply {
            Reply::Body(body) => Ok(envelope(&body)),
            Reply::Fail => Err(SoapError::Network("connection refused".to_string())),
        }
    }
}

impl Transport for ScriptedTransport {
    fn exchange(&self, request: &HttpRequest) -> Result<String, SoapError> {
        match request.action.as_str() {
            CREATE_ACTION => {
                let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
                let reply = self.creates.lock().pop_front();
                self.answer(reply.unwrap_or_else(|| created(&format!("http://cam/sub/{}", n))))
            }
            PULL_ACTION => {
                self.pull_calls.fetch_add(1, Ordering::SeqCst);
                self.pull_urls.lock().push(request.url.clone());
                let reply = self.pulls.lock().pop_front();
                match reply {
                    Some(reply) => self.answer(reply),
                    None => {
                        thread::sleep(Duration::from_millis(5));
                        self.answer(empty_pull())
                    }
                }
            }
            UNSUBSCRIBE_ACTION => {
                self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
                self.answer(Reply::Body("<UnsubscribeResponse/>".to_string()))
            }
            other => Err(SoapError::Network(format!("unexpected action {}", other))),
        }
    }
}

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:tev="http://www.onvif.org/ver10/events/wsdl" xmlns:wsnt="http://docs.oasis-open.org/wsn/b-2" xmlns:wsa="http://www.w3.org/2005/08/addressing" xmlns:tt="http://www.onvif.org/ver10/schema"><env:Body>{}</env:Body></env:Envelope>"#,
        body
    )
}

pub fn created(address: &str) -> Reply {
    Reply::Body(format!(
        "<tev:CreatePullPointSubscriptionResponse><tev:SubscriptionReference><wsa:Address>{}</wsa:Address></tev:SubscriptionReference><wsnt:CurrentTime>2024-05-01T10:00:00Z</wsnt:CurrentTime><wsnt:TerminationTime>2024-05-01T10:03:00Z</wsnt:TerminationTime></tev:CreatePullPointSubscriptionResponse>",
        address
    ))
}

pub fn empty_pull() -> Reply {
    pull_with(&[])
}

/// Pull response carrying one notification per plate
pub fn pull_with(plates: &[&str]) -> Reply {
    let notifications: String = plates
        .iter()
        .map(|plate| {
            format!(
                r#"<wsnt:NotificationMessage><wsnt:Topic>tns1:LicensePlateRecognition</wsnt:Topic><wsnt:Message><tt:Message><tt:Data><tt:SimpleItem Name="PlateNumber" Value="{}"/><tt:SimpleItem Name="Likelihood" Value="870"/></tt:Data></tt:Message></wsnt:Message></wsnt:NotificationMessage>"#,
                plate
            )
        })
        .collect();

    Reply::Body(format!(
        "<tev:PullMessagesResponse><tev:CurrentTime>2024-05-01T10:00:03Z</tev:CurrentTime><tev:TerminationTime>2024-05-01T10:03:03Z</tev:TerminationTime>{}</tev:PullMessagesResponse>",
        notifications
    ))
}

/// Poll `condition` until it holds or `timeout` passes
pub fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
