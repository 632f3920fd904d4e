//! Dispatch behavior tests against in-process host collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use virtagent::answer::{Answer, AnswerPayload};
use virtagent::command::{Command, CommandKind, InterfaceType};
use virtagent::dispatch::{CommandHandler, Dispatcher, HandlerRegistry};
use virtagent::error::{Error, Result};
use virtagent::handlers;
use virtagent::host::{
    ConnectionManager, DomainHandle, HostContext, PoolStats, RouterResource, StoragePool,
    StoragePoolManager, VifDriver,
};
use virtagent::script::ScriptRunner;
use virtagent::AgentConfig;

// ============================================================================
// Mock host collaborators
// ============================================================================

#[derive(Default)]
struct MockDomain {
    reboots: AtomicUsize,
    vnc_port: u16,
}

impl DomainHandle for MockDomain {
    fn attach_media(&self, _iso_path: &Path, _attach: bool) -> Result<String> {
        Ok("hdc".to_string())
    }

    fn scale(&self, _cpus: u32, _memory_mib: u64) -> Result<()> {
        Ok(())
    }

    fn vnc_port(&self) -> Result<u16> {
        Ok(self.vnc_port)
    }

    fn reboot(&self) -> Result<()> {
        self.reboots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MockConnections {
    domains: HashMap<String, Arc<MockDomain>>,
}

impl ConnectionManager for MockConnections {
    fn connect(&self, vm_name: &str) -> Result<Arc<dyn DomainHandle>> {
        self.domains
            .get(vm_name)
            .map(|d| Arc::clone(d) as Arc<dyn DomainHandle>)
            .ok_or_else(|| Error::connection(vm_name, "domain not defined"))
    }
}

struct MockPool {
    stats: PoolStats,
}

impl StoragePool for MockPool {
    fn stats(&self) -> Result<PoolStats> {
        Ok(self.stats)
    }

    fn delete(&self) -> Result<()> {
        Ok(())
    }

    fn prepare_client(&self) -> Result<HashMap<String, String>> {
        Ok(HashMap::from([("pool".to_string(), "mock".to_string())]))
    }
}

#[derive(Default)]
struct MockPools {
    pools: HashMap<String, Arc<MockPool>>,
}

impl StoragePoolManager for MockPools {
    fn lookup(&self, pool_uuid: &str) -> Option<Arc<dyn StoragePool>> {
        self.pools
            .get(pool_uuid)
            .map(|p| Arc::clone(p) as Arc<dyn StoragePool>)
    }
}

#[derive(Default)]
struct MockVif;

impl VifDriver for MockVif {
    fn plug(&self, _vm_name: &str, _mac: &str, _bridge: &str) -> Result<()> {
        Ok(())
    }

    fn unplug(&self, _vm_name: &str, _mac: &str) -> Result<()> {
        Ok(())
    }

    fn delete_bridge(&self, _bridge: &str) -> Result<()> {
        Ok(())
    }

    fn apply_rules(&self, _vm_name: &str, _rules: &[virtagent::command::FirewallRule]) -> Result<()> {
        Ok(())
    }
}

struct MockRouter {
    network_result: Result<bool>,
    dns_result: Result<bool>,
}

impl MockRouter {
    fn applying(network: bool, dns: bool) -> Self {
        Self {
            network_result: Ok(network),
            dns_result: Ok(dns),
        }
    }
}

impl RouterResource for MockRouter {
    fn connect(&self, _vm_name: &str) -> Result<()> {
        Ok(())
    }

    fn apply_network_params(
        &self,
        _vm_name: &str,
        _params: &HashMap<String, String>,
    ) -> Result<bool> {
        match &self.network_result {
            Ok(applied) => Ok(*applied),
            Err(_) => Err(Error::router("network", "sub-resource unreachable")),
        }
    }

    fn apply_dns_params(&self, _vm_name: &str, _params: &HashMap<String, String>) -> Result<bool> {
        match &self.dns_result {
            Ok(applied) => Ok(*applied),
            Err(_) => Err(Error::router("dns", "sub-resource unreachable")),
        }
    }
}

/// Script runner returning a canned output per script file name.
#[derive(Default)]
struct MockScripts {
    outputs: HashMap<String, Option<String>>,
    invocations: AtomicUsize,
}

impl ScriptRunner for MockScripts {
    fn run(&self, script: &Path, _args: &[String], _timeout_ms: Option<u64>) -> Option<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let name = script.file_name()?.to_str()?;
        self.outputs.get(name).cloned().flatten()
    }
}

struct TestHost {
    domains: HashMap<String, Arc<MockDomain>>,
    pools: HashMap<String, Arc<MockPool>>,
    router: MockRouter,
    scripts: MockScripts,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            domains: HashMap::new(),
            pools: HashMap::new(),
            router: MockRouter::applying(true, true),
            scripts: MockScripts::default(),
        }
    }
}

impl TestHost {
    fn with_domain(mut self, vm_name: &str, domain: MockDomain) -> Self {
        self.domains.insert(vm_name.to_string(), Arc::new(domain));
        self
    }

    fn with_pool(mut self, uuid: &str, stats: PoolStats) -> Self {
        self.pools.insert(uuid.to_string(), Arc::new(MockPool { stats }));
        self
    }

    fn with_router(mut self, router: MockRouter) -> Self {
        self.router = router;
        self
    }

    fn with_script_output(mut self, script_name: &str, output: Option<&str>) -> Self {
        self.scripts
            .outputs
            .insert(script_name.to_string(), output.map(str::to_string));
        self
    }

    fn build(self) -> HostContext {
        HostContext::new(
            Arc::new(MockConnections {
                domains: self.domains,
            }),
            Arc::new(MockPools { pools: self.pools }),
            HashMap::from([(
                InterfaceType::Bridge,
                Arc::new(MockVif) as Arc<dyn VifDriver>,
            )]),
            Arc::new(self.router),
            Arc::new(self.scripts),
        )
    }
}

fn builtin_dispatcher() -> Dispatcher {
    let config = AgentConfig::default();
    let registry = HandlerRegistry::from_handlers(handlers::builtin(&config)).unwrap();
    Dispatcher::new(registry)
}

// ============================================================================
// Resolution
// ============================================================================

/// Handler that records invocations and reports the kind it was bound for.
struct CountingHandler {
    kind: CommandKind,
    calls: Arc<AtomicUsize>,
}

impl CommandHandler for CountingHandler {
    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn execute(&self, _command: &Command, _host: &HostContext) -> Result<Answer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Answer::ok_with(AnswerPayload::Text {
            output: self.kind.to_string(),
        }))
    }
}

fn counting(kind: CommandKind) -> (Arc<dyn CommandHandler>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
        Arc::new(CountingHandler {
            kind,
            calls: Arc::clone(&calls),
        }),
        calls,
    )
}

#[test]
fn exact_kind_resolves_to_its_own_handler() {
    let (reboot, reboot_calls) = counting(CommandKind::Reboot);
    let (router, router_calls) = counting(CommandKind::RebootRouter);
    let dispatcher =
        Dispatcher::new(HandlerRegistry::from_handlers([reboot, router]).unwrap());
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::RebootRouter {
            vm_name: "r-42-VM".into(),
        },
        &host,
    );

    assert!(answer.success);
    assert_eq!(
        router_calls.load(Ordering::SeqCst),
        1,
        "Exact binding must win over the fallback chain"
    );
    assert_eq!(reboot_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn specialized_kind_falls_back_to_ancestor_handler() {
    let (reboot, reboot_calls) = counting(CommandKind::Reboot);
    let dispatcher = Dispatcher::new(HandlerRegistry::from_handlers([reboot]).unwrap());
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::RebootRouter {
            vm_name: "r-42-VM".into(),
        },
        &host,
    );

    assert!(answer.success);
    assert_eq!(reboot_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn fallback_walks_multiple_hops() {
    // reboot-vpc-router has no handler and neither does reboot-router; the
    // walk must reach the root `reboot` binding.
    let (reboot, reboot_calls) = counting(CommandKind::Reboot);
    let dispatcher = Dispatcher::new(HandlerRegistry::from_handlers([reboot]).unwrap());
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::RebootVpcRouter {
            vm_name: "r-99-VM".into(),
        },
        &host,
    );

    assert!(answer.success);
    assert_eq!(reboot_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn intermediate_ancestor_wins_over_root() {
    let (reboot, reboot_calls) = counting(CommandKind::Reboot);
    let (router, router_calls) = counting(CommandKind::RebootRouter);
    let dispatcher =
        Dispatcher::new(HandlerRegistry::from_handlers([reboot, router]).unwrap());
    let host = TestHost::default().build();

    dispatcher.dispatch(
        &Command::RebootVpcRouter {
            vm_name: "r-99-VM".into(),
        },
        &host,
    );

    assert_eq!(
        router_calls.load(Ordering::SeqCst),
        1,
        "Most specific bound ancestor must be chosen"
    );
    assert_eq!(reboot_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unresolved_kind_answers_failure_naming_the_kind() {
    let dispatcher = Dispatcher::new(HandlerRegistry::new());
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::RebootVpcRouter {
            vm_name: "r-1-VM".into(),
        },
        &host,
    );

    assert!(!answer.success);
    let message = answer.message.expect("failure must carry a message");
    assert!(
        message.contains("reboot-vpc-router"),
        "Message should name the unresolved kind: {}",
        message
    );
}

// ============================================================================
// Fault isolation
// ============================================================================

struct PanickingHandler;

impl CommandHandler for PanickingHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Ping
    }

    fn execute(&self, _command: &Command, _host: &HostContext) -> Result<Answer> {
        panic!("collaborator misbehaved");
    }
}

struct ErroringHandler;

impl CommandHandler for ErroringHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Ping
    }

    fn execute(&self, _command: &Command, _host: &HostContext) -> Result<Answer> {
        Err(Error::domain("ping", "unexpected collaborator state"))
    }
}

#[test]
fn panicking_handler_yields_failure_answer() {
    let dispatcher = Dispatcher::new(
        HandlerRegistry::from_handlers([Arc::new(PanickingHandler) as Arc<dyn CommandHandler>])
            .unwrap(),
    );
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(&Command::Ping, &host);

    assert!(!answer.success, "Panic must be downgraded to a failure answer");
    let message = answer.message.unwrap();
    assert!(
        message.contains("collaborator misbehaved"),
        "Message should derive from the panic payload: {}",
        message
    );
}

#[test]
fn erroring_handler_yields_failure_answer() {
    let dispatcher = Dispatcher::new(
        HandlerRegistry::from_handlers([Arc::new(ErroringHandler) as Arc<dyn CommandHandler>])
            .unwrap(),
    );
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(&Command::Ping, &host);

    assert!(!answer.success);
    assert!(
        answer.message.unwrap().contains("unexpected collaborator state"),
        "Message should derive from the error"
    );
}

#[test]
fn fault_in_one_dispatch_does_not_poison_the_next() {
    let (ok_handler, _calls) = counting(CommandKind::Reboot);
    let dispatcher = Dispatcher::new(
        HandlerRegistry::from_handlers([
            Arc::new(PanickingHandler) as Arc<dyn CommandHandler>,
            ok_handler,
        ])
        .unwrap(),
    );
    let host = TestHost::default().build();

    let failed = dispatcher.dispatch(&Command::Ping, &host);
    assert!(!failed.success);

    let answer = dispatcher.dispatch(
        &Command::Reboot {
            vm_name: "i-2-7-VM".into(),
        },
        &host,
    );
    assert!(answer.success, "Dispatch loop must survive a handler panic");
}

#[test]
fn dispatcher_holds_no_state_between_calls() {
    let (handler, calls) = counting(CommandKind::Ping);
    let dispatcher = Dispatcher::new(HandlerRegistry::from_handlers([handler]).unwrap());
    let host = TestHost::default().build();

    dispatcher.dispatch(&Command::Ping, &host);
    dispatcher.dispatch(&Command::Ping, &host);

    assert_eq!(
        calls.load(Ordering::SeqCst),
        2,
        "Same command dispatched twice must run the handler twice"
    );
}

// ============================================================================
// Handler scenarios
// ============================================================================

#[test]
fn attach_iso_success_carries_device_key() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_domain("i-2-7-VM", MockDomain::default())
        .build();

    let answer = dispatcher.dispatch(
        &Command::AttachIso {
            vm_name: "i-2-7-VM".into(),
            iso_path: PathBuf::from("/mnt/iso/x.iso"),
            attach: true,
        },
        &host,
    );

    assert!(answer.success);
    match answer.payload {
        Some(AnswerPayload::DeviceKey { device_key }) => assert_eq!(device_key, "hdc"),
        other => panic!("expected device key payload, got {:?}", other),
    }
}

#[test]
fn storage_stats_for_unknown_pool_is_domain_failure() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::GetStorageStats {
            pool_uuid: "a4c3b0ae".into(),
        },
        &host,
    );

    assert!(!answer.success);
    assert_eq!(
        answer.message.as_deref(),
        Some("no storage pool to get statistics from")
    );
}

#[test]
fn storage_stats_for_known_pool_reports_capacity() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_pool(
            "a4c3b0ae",
            PoolStats {
                capacity_bytes: 1 << 40,
                used_bytes: 1 << 30,
            },
        )
        .build();

    let answer = dispatcher.dispatch(
        &Command::GetStorageStats {
            pool_uuid: "a4c3b0ae".into(),
        },
        &host,
    );

    assert!(answer.success);
    match answer.payload {
        Some(AnswerPayload::StorageStats {
            capacity_bytes,
            used_bytes,
        }) => {
            assert_eq!(capacity_bytes, 1 << 40);
            assert_eq!(used_bytes, 1 << 30);
        }
        other => panic!("expected storage stats payload, got {:?}", other),
    }
}

#[test]
fn vnc_port_query_returns_port_payload() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_domain(
            "i-2-7-VM",
            MockDomain {
                vnc_port: 5901,
                ..Default::default()
            },
        )
        .build();

    let answer = dispatcher.dispatch(
        &Command::GetVncPort {
            vm_name: "i-2-7-VM".into(),
        },
        &host,
    );

    assert!(answer.success);
    assert!(matches!(
        answer.payload,
        Some(AnswerPayload::VncPort { port: 5901 })
    ));
}

#[test]
fn connection_failure_surfaces_as_failure_answer() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default().build(); // no domains defined

    let answer = dispatcher.dispatch(
        &Command::Reboot {
            vm_name: "i-404-VM".into(),
        },
        &host,
    );

    assert!(!answer.success);
    let message = answer.message.unwrap();
    assert!(
        message.contains("i-404-VM"),
        "Message should identify the VM: {}",
        message
    );
}

#[test]
fn unknown_interface_type_is_domain_failure() {
    let dispatcher = builtin_dispatcher();
    // Test host only configures the bridge driver.
    let host = TestHost::default().build();

    let answer = dispatcher.dispatch(
        &Command::DeleteBridge {
            interface_type: InterfaceType::Ovs,
            bridge: "cloudbr0".into(),
        },
        &host,
    );

    assert!(!answer.success);
    assert!(answer.message.unwrap().contains("ovs"));
}

#[test]
fn backup_script_failure_is_domain_failure() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_script_output("backup.sh", None)
        .build();

    let answer = dispatcher.dispatch(
        &Command::RunBackup {
            vm_name: "i-2-7-VM".into(),
            target: "nfs://backups/daily".into(),
        },
        &host,
    );

    assert!(!answer.success);
    assert!(answer.message.unwrap().contains("i-2-7-VM"));
}

#[test]
fn backup_script_output_is_returned_as_text_payload() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_script_output("backup.sh", Some("snapshot-20260823"))
        .build();

    let answer = dispatcher.dispatch(
        &Command::RunBackup {
            vm_name: "i-2-7-VM".into(),
            target: "nfs://backups/daily".into(),
        },
        &host,
    );

    assert!(answer.success);
    assert!(matches!(
        answer.payload,
        Some(AnswerPayload::Text { ref output }) if output == "snapshot-20260823"
    ));
}

// ============================================================================
// Router sub-resource combination
// ============================================================================

#[test]
fn router_params_full_apply_is_clean_success() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_router(MockRouter::applying(true, true))
        .build();

    let answer = dispatcher.dispatch(
        &Command::ConfigureRouterParams {
            vm_name: "r-42-VM".into(),
            params: HashMap::from([("mtu".to_string(), "1450".to_string())]),
        },
        &host,
    );

    assert!(answer.success);
    assert!(answer.message.is_none(), "Clean apply should carry no message");
}

#[test]
fn router_params_partial_apply_succeeds_with_message() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_router(MockRouter::applying(true, false))
        .build();

    let answer = dispatcher.dispatch(
        &Command::ConfigureRouterParams {
            vm_name: "r-42-VM".into(),
            params: HashMap::new(),
        },
        &host,
    );

    assert!(answer.success, "Disjunction semantics: one sub-resource suffices");
    assert!(
        answer.message.unwrap().contains("dns"),
        "Partial apply must name the failed sub-resource"
    );
}

#[test]
fn router_params_total_failure_is_domain_failure() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_router(MockRouter::applying(false, false))
        .build();

    let answer = dispatcher.dispatch(
        &Command::ConfigureRouterParams {
            vm_name: "r-42-VM".into(),
            params: HashMap::new(),
        },
        &host,
    );

    assert!(!answer.success);
}

#[test]
fn router_subresource_fault_becomes_failure_answer() {
    let dispatcher = builtin_dispatcher();
    let host = TestHost::default()
        .with_router(MockRouter {
            network_result: Err(Error::router("network", "unreachable")),
            dns_result: Ok(true),
        })
        .build();

    let answer = dispatcher.dispatch(
        &Command::ConfigureRouterParams {
            vm_name: "r-42-VM".into(),
            params: HashMap::new(),
        },
        &host,
    );

    assert!(!answer.success, "Collaborator fault must be translated, not raised");
    assert!(answer.message.unwrap().contains("router operation failed"));
}
