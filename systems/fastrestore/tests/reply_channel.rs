use fastrestore::{
    ReplyDelivery, RequestState, RestoreCommonReply, RestoreSimpleRequest, ServerIdentity,
    TimedRequests,
};
use restsim::{
    Jiffies, MessagePtr, ProcessHandle, ProcessId, SimulationBuilder, TimerId, global::anykv,
    list_pool, send_to,
};

const HANDLER_ID: ServerIdentity = ServerIdentity::new(0xfeed, 0xbeef);

#[derive(Default)]
struct Requester {
    requests: TimedRequests<RestoreCommonReply>,
    request: usize,
}

impl ProcessHandle for Requester {
    fn start(&mut self) {
        let target = list_pool("Handler")[0];
        self.request = self
            .requests
            .dispatch(target, Jiffies(100), RestoreSimpleRequest::new);
    }

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        let delivery = message.as_type::<ReplyDelivery<RestoreCommonReply>>();
        anykv::modify_or_default::<usize>("deliveries", |d| *d += 1);
        if let Some(completion) = self.requests.on_reply(from, &delivery) {
            assert_eq!(completion.request, self.request);
            anykv::modify_or_default::<Vec<ServerIdentity>>("senders", |s| {
                s.push(delivery.reply.id)
            });
        }
        if let Some(state) = self.requests.state(self.request) {
            anykv::set::<RequestState>("state", state);
        }
    }

    fn on_timer(&mut self, id: TimerId) {
        assert!(self.requests.owns_timer(id));
        if let Some(completion) = self.requests.on_timer(id) {
            anykv::set::<RequestState>("timed_out", completion.outcome.state());
        }
        assert!(!self.requests.owns_timer(id));
        anykv::set::<usize>("pending_at_deadline", self.requests.pending());
        anykv::set::<usize>("tracked_at_deadline", self.requests.tracked());
    }
}

/// Fulfills every request twice, then sends a reply nobody asked for.
#[derive(Default)]
struct CarelessHandler;

impl ProcessHandle for CarelessHandler {
    fn start(&mut self) {}

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        let request = message.as_type::<RestoreSimpleRequest>();
        request.reply.send(RestoreCommonReply::new(HANDLER_ID));
        assert!(request.reply.is_sent());
        request.reply.send(RestoreCommonReply::new(HANDLER_ID));

        send_to(
            from,
            ReplyDelivery {
                request: usize::MAX,
                reply: RestoreCommonReply::new(HANDLER_ID),
            },
        );
    }

    fn on_timer(&mut self, _id: TimerId) {}
}

#[test]
fn second_fulfillment_and_stray_replies_are_dropped() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<Requester>("Requester", 1)
        .add_pool::<CarelessHandler>("Handler", 1)
        .build();

    sim.run();

    // The real reply and the stray one reach the requester, the duplicate never leaves
    assert_eq!(anykv::get::<usize>("deliveries"), 2);
    assert_eq!(anykv::get::<Vec<ServerIdentity>>("senders"), vec![HANDLER_ID]);
    assert_eq!(anykv::get::<RequestState>("state"), RequestState::Fulfilled);
    assert_eq!(anykv::try_get::<RequestState>("timed_out"), None);
    assert_eq!(anykv::get::<usize>("pending_at_deadline"), 0);
}

#[test]
fn finished_requests_are_forgotten_at_their_deadline() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<Requester>("Requester", 1)
        .add_pool::<CarelessHandler>("Handler", 1)
        .build();

    sim.run();

    assert_eq!(anykv::get::<RequestState>("state"), RequestState::Fulfilled);
    assert_eq!(anykv::get::<usize>("tracked_at_deadline"), 0);
}

#[test]
fn timed_out_requests_are_forgotten() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<Requester>("Requester", 1)
        .add_pool::<CarelessHandler>("Handler", 1)
        .offline("Handler", 0)
        .build();

    sim.run();

    assert_eq!(anykv::try_get::<usize>("deliveries"), None);
    assert_eq!(anykv::get::<RequestState>("timed_out"), RequestState::TimedOut);
    assert_eq!(anykv::get::<usize>("pending_at_deadline"), 0);
    assert_eq!(anykv::get::<usize>("tracked_at_deadline"), 0);
}
