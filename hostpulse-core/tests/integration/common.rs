//! Scripted executor shared by the scheduler tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hostpulse_core::monitoring::commands::{CPU_COMMAND, DIRECT_STATS_COMMAND, IDENTITY_COMMAND};
use hostpulse_core::monitoring::{
    ChannelPublisher, CommandExecutor, ExecError, PollingConfig, StatsEvent, StatsScheduler,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

pub const IDENTITY_OUTPUT: &str =
    "web-01\nNAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"24.04\"\n";

pub const CPU_FIRST: &str = "cpu  100 0 50 800 10 0 0 0 0 0\n";

/// 75 % busy relative to [`CPU_FIRST`]
pub const CPU_SECOND: &str = "cpu  200 0 100 850 10 0 0 0 0 0\n";

pub const DIRECT_STATS: &str = "\
               total        used        free      shared  buff/cache   available
Mem:      8000000000  2000000000  1000000000           0  5000000000  5500000000
Swap:              0           0           0
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/sda1        100000000  40000000  60000000      40% /
 09:00:00 up 3 days,  1:00,  1 user,  load average: 0.00, 0.00, 0.00
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0: 1000000    1000    0    0    0     0          0         0   500000     800    0    0    0     0       0          0
10.0.0.5
";

/// A recorded `exec` call
#[derive(Debug, Clone)]
pub struct Call {
    pub connection_id: String,
    pub command: String,
    pub at: Instant,
}

/// Executor answering from a per-command script
pub struct ScriptedExecutor {
    responses: Mutex<HashMap<String, Result<String, ExecError>>>,
    fallback: Mutex<Result<String, ExecError>>,
    calls: Mutex<Vec<Call>>,
    open: AtomicBool,
    delay: Duration,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fallback: Mutex::new(Err(ExecError::EmptyOutput)),
            calls: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
            delay: Duration::ZERO,
        }
    }

    /// A host answering every Direct command
    pub fn direct_host() -> Self {
        let exec = Self::new();
        exec.respond(IDENTITY_COMMAND, Ok(IDENTITY_OUTPUT.to_string()));
        exec.respond(CPU_COMMAND, Ok(CPU_FIRST.to_string()));
        exec.respond(DIRECT_STATS_COMMAND, Ok(DIRECT_STATS.to_string()));
        exec
    }

    /// Every command takes `delay` to complete
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond(&self, command: &str, result: Result<String, ExecError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(command.to_string(), result);
    }

    /// Answer for commands without a scripted response
    pub fn respond_default(&self, result: Result<String, ExecError>) {
        *self.fallback.lock().unwrap() = result;
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.command == command).count()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn exec(&self, connection_id: &str, command: &str) -> Result<String, ExecError> {
        self.calls.lock().unwrap().push(Call {
            connection_id: connection_id.to_string(),
            command: command.to_string(),
            at: Instant::now(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.responses.lock().unwrap().get(command).cloned();
        scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }

    fn is_open(&self, _connection_id: &str) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub scheduler: StatsScheduler,
    pub executor: Arc<ScriptedExecutor>,
    pub events: UnboundedReceiver<StatsEvent>,
}

impl Harness {
    pub fn new(executor: ScriptedExecutor) -> Self {
        let executor = Arc::new(executor);
        let (publisher, events) = ChannelPublisher::new();
        let scheduler = StatsScheduler::new(
            Arc::new(PollingConfig::new()),
            Arc::clone(&executor) as Arc<dyn CommandExecutor>,
            Arc::new(publisher),
        );
        Self {
            scheduler,
            executor,
            events,
        }
    }

    /// Drains every event published so far
    pub fn drain(&mut self) -> Vec<StatsEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
