//! Unit tests for the poll loop

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::controller::Controller;
    use crate::identity::PlaceholderIdentity;
    use crate::test_utils::*;
    use proxmox_client::{ClusterResource, MockProxmoxClient};
    use std::time::Duration;

    fn controller(inventory: &MockProxmoxClient, mocks: &Mocks, types: Vec<String>) -> Controller {
        let identity = test_identity();
        Controller::new(
            Some(Box::new(inventory.clone())),
            Box::new(PlaceholderIdentity::new(identity.mac, identity.ip)),
            mock_provisioner(mocks, true, true),
            types,
            Duration::from_millis(1),
        )
    }

    fn typed(name: &str, resource_type: &str) -> ClusterResource {
        ClusterResource {
            resource_type: Some(resource_type.to_string()),
            ..ClusterResource::named(name)
        }
    }

    #[tokio::test]
    async fn test_empty_inventory_touches_nothing() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        let mocks = Mocks::new();

        let report = controller(&inventory, &mocks, Vec::new()).run_cycle().await;

        assert!(report.resources.is_empty());
        assert_eq!(inventory.inventory_calls(), 1);
        assert!(mocks.router.commands().is_empty());
        assert!(mocks.guacamole.profiles().is_empty());
        assert!(mocks.wol.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_vm_end_to_end() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        inventory.set_inventory(vec![ClusterResource::named("vm-42")]);
        let mocks = Mocks::new();
        mocks.wol.add_connection("vm-42", 3);

        let report = controller(&inventory, &mocks, Vec::new()).run_cycle().await;

        let commands = mocks.router.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("vm-42"));
        assert!(commands[0].contains(TEST_IP));
        assert!(commands[0].contains(TEST_MAC));

        let profiles = mocks.guacamole.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(
            serde_json::to_value(profiles[0].request_body()).unwrap(),
            serde_json::json!({"hostname": TEST_IP, "protocol": "ssh"})
        );

        assert_eq!(
            mocks.wol.calls(),
            vec![("vm-42".to_string(), TEST_MAC.to_string())]
        );
        assert_eq!(report.tally().applied, 3);
    }

    #[tokio::test]
    async fn test_proxmox_failure_is_an_empty_cycle() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        inventory.set_inventory(vec![ClusterResource::named("vm-42")]);
        inventory.fail_with_status(401);
        let mocks = Mocks::new();

        let report = controller(&inventory, &mocks, Vec::new()).run_cycle().await;

        assert!(report.resources.is_empty());
        assert!(mocks.router.commands().is_empty());
        assert!(logs.contains("Proxmox inventory error"));
    }

    #[tokio::test]
    async fn test_resources_processed_in_order() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        inventory.set_inventory(vec![
            ClusterResource::named("vm-1"),
            ClusterResource::named("vm-2"),
            ClusterResource::named("vm-3"),
        ]);
        let mocks = Mocks::new();

        let report = controller(&inventory, &mocks, Vec::new()).run_cycle().await;

        let names: Vec<_> = report.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["vm-1", "vm-2", "vm-3"]);
        let hostnames: Vec<_> = mocks
            .router
            .mappings()
            .into_iter()
            .map(|m| m.hostname)
            .collect();
        assert_eq!(hostnames, vec!["vm-1", "vm-2", "vm-3"]);
    }

    #[tokio::test]
    async fn test_unnamed_resource_is_ignored() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        inventory.set_inventory(vec![
            ClusterResource {
                id: Some("node/pve1".to_string()),
                resource_type: Some("node".to_string()),
                ..Default::default()
            },
            ClusterResource::named("vm-42"),
        ]);
        let mocks = Mocks::new();

        let report = controller(&inventory, &mocks, Vec::new()).run_cycle().await;

        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(mocks.router.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_type_filter() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        inventory.set_inventory(vec![
            typed("vm-1", "qemu"),
            typed("ct-1", "lxc"),
            typed("local", "storage"),
        ]);
        let mocks = Mocks::new();

        let report = controller(&inventory, &mocks, vec!["qemu".to_string(), "lxc".to_string()])
            .run_cycle()
            .await;

        let names: Vec<_> = report.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["vm-1", "ct-1"]);
        assert_eq!(report.ignored, 1);
    }

    #[tokio::test]
    async fn test_disabled_inventory_does_nothing() {
        let mocks = Mocks::new();
        let identity = test_identity();
        let controller = Controller::new(
            None,
            Box::new(PlaceholderIdentity::new(identity.mac, identity.ip)),
            mock_provisioner(&mocks, true, true),
            Vec::new(),
            Duration::from_secs(60),
        );

        let report = controller.run_cycle().await;
        controller.check_connectivity().await;

        assert!(report.resources.is_empty());
        assert!(mocks.router.commands().is_empty());
    }

    #[tokio::test]
    async fn test_run_until_stops_after_current_cycle() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        let mocks = Mocks::new();

        controller(&inventory, &mocks, Vec::new())
            .run_until(async {})
            .await;

        assert_eq!(inventory.inventory_calls(), 1);
    }

    #[tokio::test]
    async fn test_run_until_keeps_polling() {
        let inventory = MockProxmoxClient::new("https://pve.test:8006");
        let mocks = Mocks::new();

        controller(&inventory, &mocks, Vec::new())
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        assert!(inventory.inventory_calls() >= 2);
    }

    #[test]
    fn test_from_config_with_everything_disabled() {
        let config = Config::from_yaml(
            "proxmox:\n  enabled: false\n  api_url: ''\n  user: ''\n",
        )
        .unwrap();

        let controller = Controller::from_config(&config).unwrap();
        assert!(format!("{:?}", controller).contains("inventory: None"));
    }

    #[test]
    fn test_from_config_builds_clients() {
        let config = Config::from_yaml(
            r#"
proxmox:
  api_url: https://pve.test:8006
  user: root@pam
  password: x
ubiquiti:
  enabled: true
  host: 172.16.1.1
  user: ubnt
guacamole:
  enabled: true
  api_url: https://guac.test/guacamole
  user: guacadmin
  password: y
  db_host: db.test
  db_user: guac
  db_name: guacamole_db
"#,
        )
        .unwrap();

        let debug = format!("{:?}", Controller::from_config(&config).unwrap());
        assert!(debug.contains("https://pve.test:8006"));
        assert!(debug.contains("172.16.1.1"));
        assert!(debug.contains("https://guac.test/guacamole"));
    }
}
