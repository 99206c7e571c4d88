use super::*;
use crate::test_support::{control_account, planning_package, work_package};
use meridian_shared::types::BudgetId;
use rust_decimal_macros::dec;

fn hierarchy_with_account() -> (CostHierarchy, ControlAccountId) {
    let mut h = CostHierarchy::new(BudgetId::new());
    let ca = control_account("CA-1");
    let id = ca.id;
    h.insert_control_account(ca).unwrap();
    (h, id)
}

#[test]
fn test_bac_follows_children() {
    let (mut h, ca) = hierarchy_with_account();
    h.insert_work_package(work_package(ca, "WP-1", dec!(40000))).unwrap();
    h.insert_work_package(work_package(ca, "WP-2", dec!(35000))).unwrap();
    h.insert_planning_package(planning_package(ca, "PP-1", dec!(25000))).unwrap();

    assert_eq!(h.control_account(ca).unwrap().bac, dec!(100000));
    assert_eq!(h.computed_bac(ca).unwrap(), dec!(100000));
    assert_eq!(h.total_bac().unwrap(), dec!(100000));
}

#[test]
fn test_bac_overflow_rejected() {
    let (mut h, ca) = hierarchy_with_account();
    let mut big = work_package(ca, "WP-1", dec!(1));
    big.budget = Decimal::MAX;
    h.insert_work_package(big).unwrap();

    let err = h
        .insert_work_package(work_package(ca, "WP-2", dec!(1)))
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Overflow));
    assert_eq!(h.work_packages().count(), 1);
    assert_eq!(h.control_account(ca).unwrap().bac, Decimal::MAX);
    assert!(matches!(
        h.insert_planning_package(planning_package(ca, "PP-1", dec!(1))),
        Err(HierarchyError::Overflow)
    ));
}

#[test]
fn test_converted_planning_package_leaves_bac() {
    let (mut h, ca) = hierarchy_with_account();
    let pp = planning_package(ca, "PP-1", dec!(25000));
    let pp_id = pp.id;
    h.insert_planning_package(pp).unwrap();
    h.mark_converted(pp_id, UserId::new()).unwrap();

    assert_eq!(h.control_account(ca).unwrap().bac, Decimal::ZERO);
    assert_eq!(h.unconverted_planning_packages_of(ca).count(), 0);
}

#[test]
fn test_removed_work_package_is_hidden() {
    let (mut h, ca) = hierarchy_with_account();
    let wp = work_package(ca, "WP-1", dec!(1000));
    let wp_id = wp.id;
    h.insert_work_package(wp).unwrap();
    h.remove_work_package(wp_id, UserId::new()).unwrap();

    assert!(matches!(
        h.work_package(wp_id),
        Err(HierarchyError::WorkPackageNotFound(_))
    ));
    assert_eq!(h.control_account(ca).unwrap().bac, Decimal::ZERO);
    assert!(h.remove_work_package(wp_id, UserId::new()).is_err());
}

#[test]
fn test_duplicate_codes_rejected() {
    let (mut h, ca) = hierarchy_with_account();
    h.insert_work_package(work_package(ca, "WP-1", dec!(1))).unwrap();
    assert!(matches!(
        h.insert_work_package(work_package(ca, "WP-1", dec!(1))),
        Err(HierarchyError::DuplicateCode(_))
    ));
    assert!(matches!(
        h.insert_planning_package(planning_package(ca, "WP-1", dec!(1))),
        Err(HierarchyError::DuplicateCode(_))
    ));
    assert!(matches!(
        h.insert_control_account(control_account("CA-1")),
        Err(HierarchyError::DuplicateCode(_))
    ));
}

#[test]
fn test_child_requires_open_parent() {
    let (mut h, _) = hierarchy_with_account();
    let orphan = work_package(ControlAccountId::new(), "WP-1", dec!(1));
    assert!(matches!(
        h.insert_work_package(orphan),
        Err(HierarchyError::ControlAccountNotFound(_))
    ));

    let mut closed = control_account("CA-2");
    closed.status = ControlAccountStatus::Closed;
    let closed_id = closed.id;
    h.insert_control_account(closed).unwrap();
    assert!(matches!(
        h.insert_work_package(work_package(closed_id, "WP-1", dec!(1))),
        Err(HierarchyError::ControlAccountClosed(_))
    ));
}

#[test]
fn test_replace_moves_budget_between_accounts() {
    let (mut h, ca1) = hierarchy_with_account();
    let ca2 = control_account("CA-2");
    let ca2_id = ca2.id;
    h.insert_control_account(ca2).unwrap();

    let wp = work_package(ca1, "WP-1", dec!(500));
    h.insert_work_package(wp.clone()).unwrap();

    let mut moved = wp;
    moved.control_account_id = ca2_id;
    moved.budget = dec!(700);
    h.replace_work_package(moved).unwrap();

    assert_eq!(h.control_account(ca1).unwrap().bac, Decimal::ZERO);
    assert_eq!(h.control_account(ca2_id).unwrap().bac, dec!(700));
}

#[test]
fn test_clone_for_budget_keeps_entity_ids() {
    let (mut h, ca) = hierarchy_with_account();
    let wp = work_package(ca, "WP-1", dec!(500));
    let wp_id = wp.id;
    h.insert_work_package(wp).unwrap();

    let next = BudgetId::new();
    let copy = h.clone_for_budget(next);
    assert_eq!(copy.budget_id(), next);
    assert!(copy.work_package(wp_id).is_ok());
    assert_eq!(copy.control_account_ids(), h.control_account_ids());
}

#[test]
fn test_apply_progress() {
    let (mut h, ca) = hierarchy_with_account();
    let wp = work_package(ca, "WP-1", dec!(500));
    let wp_id = wp.id;
    h.insert_work_package(wp).unwrap();

    h.apply_progress(wp_id, dec!(40), dec!(220), dec!(300), UserId::new())
        .unwrap();
    let wp = h.work_package(wp_id).unwrap();
    assert_eq!(wp.progress_percentage, dec!(40));
    assert_eq!(wp.actual_cost, dec!(220));
    assert_eq!(wp.committed_cost, dec!(300));
}
