use restsim::{
    Distributions, Jiffies, LatencyDescription, Message, MessagePtr, ProcessHandle, ProcessId,
    SimulationBuilder, TimerId, global::anykv, now, rank, schedule_timer_after, send_to,
};

enum PingPongMessage {
    Ping,
    Pong,
}

impl Message for PingPongMessage {}

#[derive(Default)]
struct PingPong;

impl ProcessHandle for PingPong {
    fn start(&mut self) {
        if rank() == 1 {
            send_to(2, PingPongMessage::Ping);
        }
    }

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        match *message.as_type::<PingPongMessage>() {
            PingPongMessage::Ping => {
                anykv::modify_or_default::<usize>("pings", |p| *p += 1);
                send_to(from, PingPongMessage::Pong);
            }
            PingPongMessage::Pong => {
                anykv::modify_or_default::<usize>("pongs", |p| *p += 1);
                if anykv::get::<usize>("pongs") < 10 {
                    send_to(from, PingPongMessage::Ping);
                }
            }
        }
    }

    fn on_timer(&mut self, _id: TimerId) {}
}

#[test]
fn pingpong_finishes_when_no_events_left() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<PingPong>("Pool", 2)
        .latency_topology(&[LatencyDescription::WithinPool(
            "Pool",
            Distributions::Uniform(Jiffies(0), Jiffies(10)),
        )])
        .seed(5)
        .build();

    sim.run();

    assert_eq!(anykv::get::<usize>("pings"), 10);
    assert_eq!(anykv::get::<usize>("pongs"), 10);
    assert!(now() < Jiffies(1_000_000));
}

#[derive(Default)]
struct Alarm {
    timer: Option<TimerId>,
}

impl ProcessHandle for Alarm {
    fn start(&mut self) {
        self.timer = Some(schedule_timer_after(Jiffies(250)));
    }

    fn on_message(&mut self, _from: ProcessId, _message: MessagePtr) {
        anykv::modify_or_default::<usize>("alarm_messages", |m| *m += 1);
    }

    fn on_timer(&mut self, id: TimerId) {
        assert_eq!(Some(id), self.timer);
        anykv::set::<Jiffies>(&format!("fired/{}", rank()), now());
    }

    fn on_stop(&mut self) {
        anykv::set::<Jiffies>(&format!("stopped/{}", rank()), now());
    }
}

#[test]
fn timers_fire_exactly_after_delay() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<Alarm>("Alarms", 1)
        .build();

    sim.run();

    assert_eq!(anykv::get::<Jiffies>("fired/1"), Jiffies(250));
}

#[test]
fn stopped_process_sees_no_more_events() {
    let mut sim = SimulationBuilder::default()
        .add_pool::<Alarm>("Alarms", 2)
        .stop_at("Alarms", 1, Jiffies(100))
        .offline("Alarms", 0)
        .build();

    sim.run();

    assert_eq!(anykv::get::<Jiffies>("stopped/2"), Jiffies(100));
    assert_eq!(anykv::try_get::<Jiffies>("fired/2"), None);
    // Offline processes are never started, so they never armed a timer
    assert_eq!(anykv::try_get::<Jiffies>("fired/1"), None);
    assert_eq!(anykv::try_get::<Jiffies>("stopped/1"), None);
}

struct Greeter {
    greeting: &'static str,
}

impl ProcessHandle for Greeter {
    fn start(&mut self) {
        for peer in restsim::list_pool("Greeters") {
            if peer != rank() {
                send_to(peer, Greeting(self.greeting));
            }
        }
    }

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        let greeting = message.try_as::<Greeting>().expect("only greetings travel here");
        anykv::modify_or_default::<Vec<(ProcessId, &'static str)>>("greetings", |g| {
            g.push((from, greeting.0))
        });
    }

    fn on_timer(&mut self, _id: TimerId) {}
}

struct Greeting(&'static str);

impl Message for Greeting {}

#[test]
fn factory_pools_carry_their_own_state() {
    let names = ["hello", "hola", "salut"];
    let mut sim = SimulationBuilder::default()
        .add_pool_with("Greeters", names.len(), |i| Greeter { greeting: names[i] })
        .build();

    sim.run();

    let mut greetings = anykv::get::<Vec<(ProcessId, &'static str)>>("greetings");
    greetings.sort();
    assert_eq!(
        greetings,
        vec![
            (1, "hello"),
            (1, "hello"),
            (2, "hola"),
            (2, "hola"),
            (3, "salut"),
            (3, "salut"),
        ]
    );
}
