use capkey::{Action, ApiKey, ApiKeyError, Caveat, Denial, Operation, RevocationSet, Secret};

fn lineage(s: &Secret) -> (ApiKey, ApiKey, ApiKey) {
    let k0 = ApiKey::new(s);
    let k1 = k0.restrict(&Caveat::disallow(Operation::Delete)).unwrap();
    let k2 = k1.restrict(&Caveat::default().with_buckets(["alpha"])).unwrap();
    (k0, k1, k2)
}

fn read_alpha() -> Action {
    Action::now(Operation::Read).with_bucket("alpha")
}

#[test]
fn test_revoked_head_revokes_descendants() {
    let s = Secret::from_bytes([1u8; 32]);
    let (k0, _, k2) = lineage(&s);

    let revoked: RevocationSet = [k0.head()].into_iter().collect();
    assert!(matches!(
        k2.check(&s, &read_alpha(), &revoked),
        Err(ApiKeyError::Unauthorized(Denial::HeadRevoked))
    ));
}

#[test]
fn test_revoked_ancestor_tail_revokes_descendants() {
    let s = Secret::from_bytes([1u8; 32]);
    let (k0, k1, k2) = lineage(&s);

    // k2's own tail differs from both ancestors' tails, yet each of them
    // revokes it.
    assert_ne!(k2.tail(), k1.tail());
    assert_ne!(k2.tail(), k0.tail());

    for (position, ancestor) in [(0, &k0), (1, &k1)] {
        let revoked: RevocationSet = [ancestor.tail()].into_iter().collect();
        assert!(matches!(
            k2.check(&s, &read_alpha(), &revoked),
            Err(ApiKeyError::Unauthorized(Denial::TailRevoked { position: p })) if p == position
        ));
    }

    let revoked: RevocationSet = [k2.tail()].into_iter().collect();
    assert!(matches!(
        k2.check(&s, &read_alpha(), &revoked),
        Err(ApiKeyError::Unauthorized(Denial::TailRevoked { position: 2 }))
    ));
}

#[test]
fn test_revoking_a_child_spares_parent_and_siblings() {
    let s = Secret::from_bytes([1u8; 32]);
    let (_, k1, k2) = lineage(&s);
    let sibling = k1
        .restrict(&Caveat::default().with_buckets(["beta"]))
        .unwrap();

    let revoked: RevocationSet = [k2.tail()].into_iter().collect();
    assert!(k1.check(&s, &read_alpha(), &revoked).is_ok());
    assert!(sibling
        .check(&s, &Action::now(Operation::Read).with_bucket("beta"), &revoked)
        .is_ok());
}

#[test]
fn test_caveat_denial_reported_before_revocation() {
    let s = Secret::from_bytes([1u8; 32]);
    let (_, _, k2) = lineage(&s);

    let revoked: RevocationSet = [k2.tail()].into_iter().collect();
    let delete = Action::now(Operation::Delete).with_bucket("alpha");
    assert!(matches!(
        k2.check(&s, &delete, &revoked),
        Err(ApiKeyError::Unauthorized(Denial::ActionDisallowed { index: 0 }))
    ));
}

#[test]
fn test_unrelated_entries_do_not_revoke() {
    let s = Secret::from_bytes([1u8; 32]);
    let (_, _, k2) = lineage(&s);

    let other = Secret::from_bytes([2u8; 32]);
    let foreign = ApiKey::new(&other);
    let revoked: RevocationSet = vec![foreign.head().to_vec(), foreign.tail().to_vec(), b"junk".to_vec()]
        .into_iter()
        .collect();

    assert!(k2.check(&s, &read_alpha(), &revoked).is_ok());
}
