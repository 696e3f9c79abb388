impl World {
    fn run_system(
        &mut self,
        system_id: WorldSystemId,
        now_ms: u64,
        input: &TickInput,
        report: &mut TickReport,
    ) {
        match system_id {
            WorldSystemId::PlayerInput => self.run_player_input(input, report),
            WorldSystemId::KeyTiles => self.run_key_tiles(report),
            WorldSystemId::Pickups => self.run_pickups(report),
            WorldSystemId::Enemies => self.run_enemies(now_ms, report),
            WorldSystemId::Sight => self.run_sight(input),
            WorldSystemId::Weapons => self.run_weapons(now_ms, report),
        }
    }

    fn run_player_input(&mut self, input: &TickInput, report: &mut TickReport) {
        let state = &mut self.player_state;
        let player = &mut self.player;
        if !player.body.is_visible() {
            return;
        }

        if input.switch_weapon {
            state.weapon = state.weapon.toggled();
            player.sprites.walk = self.player_sprites.walk(state.weapon).clone();
            let walk = player.sprites.walk.clone();
            player.show_frame(&walk, 0);
            debug!(weapon = ?state.weapon, "weapon_switched");
        }
        if input.fire && !state.firing {
            state.firing = true;
            player.animation.set_frame(1);
        }
        if input.cease_fire && state.weapon == Weapon::Rifle && state.firing {
            state.firing = false;
            let walk = player.sprites.walk.clone();
            player.show_frame(&walk, 0);
        }
        if input.melee && !state.melee {
            state.melee = true;
            player.animation.set_frame(1);
            let swing = player.sprites.attack.clone();
            player.show_frame(&swing, 1);
        }

        player.motion.set_intent(input.intent);
        player.motion.set_running(input.running);
        report.player_moved = player.motion.update(&mut player.body, &self.grid, true);
        player.moving = report.player_moved;

        let previous = player.body.rotation();
        let angle = player.body.exact_centre().angle_to(input.aim_point);
        player.body.face_angle(f64::from(angle));
        state.rotation_blocked = tile_collision(&player.body, &self.grid, 0, 0, true);
        if state.rotation_blocked {
            player.body.set_rotation(previous);
        }

        self.viewport = self
            .config
            .viewport
            .centred_on(player.body.exact_centre());
    }

    fn run_key_tiles(&mut self, report: &mut TickReport) {
        if !report.player_moved {
            return;
        }
        let centre = self.player.body.exact_centre();
        let Some(tile) = self.grid.tile_of_pixel(centre.x, centre.y) else {
            return;
        };
        if self.keys.progress_reached(&self.grid, tile) {
            report.level_progressed = true;
            info!(x = tile.x, y = tile.y, "level_progress_reached");
            return;
        }

        let outcome = self.keys.trigger_at(&mut self.grid, tile);
        if outcome.triggered {
            report.keys_triggered += 1;
        }
        report.level_completed |= outcome.level_completed;
        if outcome.grid_changed {
            self.graph.rebuild(&self.grid);
            report.graph_rebuilt = true;
        }
    }

    fn run_pickups(&mut self, report: &mut TickReport) {
        let reach = self.config.pickup_reach;
        let player_body = &self.player.body;
        let mut collected = Vec::new();
        for agent in &self.agents {
            let AgentKind::Pickup(kind) = agent.kind() else {
                continue;
            };
            let body = &agent.body;
            if !body.is_visible() || !body.is_in_screen(&self.viewport) {
                continue;
            }
            let distance = player_body.position().distance_to(body.position()) as i32;
            if distance > body.width() as i32 + reach || distance > body.height() as i32 + reach {
                continue;
            }
            if objects_collide(player_body, body) {
                collected.push((agent.id(), kind));
            }
        }

        for (id, kind) in collected {
            self.player
                .vitals
                .collect(kind, self.config.ammo_pickup_amount);
            self.agents.retain(|agent| agent.id() != id);
            report.pickups_collected.push(kind);
            report.despawned.push(id);
            info!(
                agent = id.get(),
                kind = ?kind,
                health = self.player.vitals.health,
                armour = self.player.vitals.armour,
                ammo = self.player.vitals.ammo,
                "pickup_collected"
            );
        }
    }

    fn run_enemies(&mut self, now_ms: u64, report: &mut TickReport) {
        let target = self.player.body.exact_centre();
        let lags = self.config.animation;
        let mut finished = Vec::new();

        for agent in &mut self.agents {
            let Some(kind) = agent.kind().enemy() else {
                continue;
            };
            if !agent.body.is_visible()
                || (!agent.spotted && !agent.body.is_in_screen(&self.viewport))
            {
                continue;
            }

            if !agent.spotted {
                let centre = agent.body.exact_centre();
                if !line_of_sight(
                    &self.grid,
                    centre,
                    target,
                    self.config.steering.coarse_sight_step,
                ) {
                    continue;
                }
                agent.spotted = true;
                report.enemies_spotted += 1;
                info!(agent = agent.id().get(), kind = ?kind, "enemy_spotted_target");
            }

            if agent.is_dead() {
                let death = agent.sprites.death.clone();
                if agent.animation.frame() + 1 >= death.len() {
                    finished.push(agent.id());
                    continue;
                }
                if agent
                    .animation
                    .advance(now_ms, death.len(), lags.enemy_death_ms)
                {
                    let frame = agent.animation.frame();
                    agent.show_frame(&death, frame);
                }
                continue;
            }

            let distance = agent.body.exact_centre().distance_to(target) as i32;
            if distance < self.config.attack_range || agent.attacking {
                agent.attacking = true;
                agent.moving = false;
                let swing = agent.sprites.attack.clone();
                if agent
                    .animation
                    .advance(now_ms, swing.len(), lags.enemy_melee_ms)
                {
                    let frame = agent.animation.frame();
                    agent.show_frame(&swing, frame);
                    if frame % 3 == 1 && bodies_touch(&agent.body, &self.player.body) {
                        let outcome = self.player.vitals.apply_player_hit();
                        report.player_hits.push(outcome);
                        debug!(
                            agent = agent.id().get(),
                            health = self.player.vitals.health,
                            armour = self.player.vitals.armour,
                            "player_hit"
                        );
                        if outcome.killed {
                            info!(agent = agent.id().get(), "player_killed");
                        }
                    }
                }
                if agent.animation.frame() == 0 {
                    agent.attacking = false;
                }
                continue;
            }

            let Some(steering) = agent.steering.as_mut() else {
                continue;
            };
            let mut ctx = SteeringContext {
                grid: &self.grid,
                graph: &mut self.graph,
                target,
                tuning: &self.config.steering,
            };
            agent.moving = steering.steer(&mut agent.body, &mut agent.motion, &mut ctx);
            if agent.moving {
                report.enemies_moved += 1;
                let walk = agent.sprites.walk.clone();
                if agent
                    .animation
                    .advance(now_ms, walk.len(), lags.enemy_walk_ms)
                {
                    let frame = agent.animation.frame();
                    agent.show_frame(&walk, frame);
                }
            }
        }

        for id in finished {
            self.despawn_enemy(id, report);
        }
    }

    /// Armoured enemies leave an ammo pickup behind when drop frames are registered.
    fn despawn_enemy(&mut self, id: AgentId, report: &mut TickReport) {
        let Some(index) = self.agents.iter().position(|agent| agent.id() == id) else {
            return;
        };
        let agent = self.agents.remove(index);
        report.despawned.push(id);
        debug!(agent = id.get(), "enemy_despawned");

        if agent.kind() != AgentKind::Enemy(EnemyKind::Armoured) {
            return;
        }
        let Some(frames) = self.pickup_sprites.get(&PickupKind::Ammo).cloned() else {
            return;
        };
        let Some(handle) = MaskHandle::new(frames, 0) else {
            return;
        };
        let body = Body::new(agent.body.exact_centre(), handle, 0.5, 0.5);
        let drop = self.spawn_pickup(PickupKind::Ammo, body);
        report.dropped.push(drop);
    }

    fn run_sight(&mut self, input: &TickInput) {
        self.in_sights = InSights::default();
        self.sight_line = None;
        let state = self.player_state;
        if state.melee || state.rotation_blocked || !self.player.body.is_visible() {
            return;
        }
        let weapons = self.config.weapons;
        let Some((muzzle, angle)) = aim(
            &self.player.body,
            weapons.muzzle(state.weapon),
            input.aim_point,
            weapons.aim_buffer,
        ) else {
            return;
        };

        let candidates: Vec<SightCandidate<'_>> = self
            .agents
            .iter()
            .filter(|agent| agent.kind().enemy().is_some())
            .map(|agent| SightCandidate {
                id: agent.id(),
                body: &agent.body,
                alive: !agent.is_dead(),
            })
            .collect();
        let ray = SightRay {
            shooter: self.player.id(),
            from: muzzle,
            angle,
            step: self.config.fine_sight_step,
        };
        let trace = trace_sight(&self.grid, &candidates, &self.viewport, &ray);
        self.in_sights = trace.in_sights;
        self.sight_line = Some((muzzle, trace.end));
    }

    fn run_weapons(&mut self, now_ms: u64, report: &mut TickReport) {
        let lags = self.config.animation;
        let state = &mut self.player_state;
        let player = &mut self.player;
        if !player.body.is_visible() {
            return;
        }

        if state.firing {
            if player.animation.frame() == 0 && state.weapon == Weapon::Pistol {
                state.firing = false;
            } else if state.weapon == Weapon::Rifle && player.vitals.ammo == 0 {
                state.firing = false;
                let walk = player.sprites.walk.clone();
                player.show_frame(&walk, 0);
            } else {
                let shot_frames = self.player_sprites.shot(state.weapon).len();
                if player
                    .animation
                    .advance(now_ms, shot_frames, lags.player_shot_ms)
                {
                    let frame = player.animation.frame();
                    let lands = match state.weapon {
                        Weapon::Pistol => frame == 0,
                        Weapon::Rifle => frame % 3 == 2,
                    };
                    if lands {
                        if state.weapon == Weapon::Rifle {
                            player.vitals.ammo = player.vitals.ammo.saturating_sub(1);
                        }
                        if let Some(target) = self.in_sights.target {
                            if let Some(enemy) =
                                self.agents.iter_mut().find(|agent| agent.id() == target)
                            {
                                let source = AttackSource::from(state.weapon);
                                land_hit(enemy, source, self.in_sights.crit_distance, report);
                            }
                        }
                    }
                }
            }
        } else if state.melee {
            if player.animation.frame() == 0 {
                state.melee = false;
                let walk = player.sprites.walk.clone();
                player.show_frame(&walk, 0);
            } else {
                let swing = player.sprites.attack.clone();
                if player
                    .animation
                    .advance(now_ms, swing.len(), lags.player_melee_ms)
                {
                    let frame = player.animation.frame();
                    player.show_frame(&swing, frame);
                    if (4..=6).contains(&frame) {
                        let crit = self.config.weapons.melee_crit;
                        for enemy in &mut self.agents {
                            if enemy.kind().enemy().is_none()
                                || enemy.is_dead()
                                || !enemy.body.is_visible()
                                || !enemy.body.is_in_screen(&self.viewport)
                            {
                                continue;
                            }
                            if bodies_touch(&player.body, &enemy.body) {
                                land_hit(enemy, AttackSource::Melee, crit, report);
                            }
                        }
                    }
                }
            }
        } else if player.moving {
            let walk = player.sprites.walk.clone();
            if player
                .animation
                .advance(now_ms, walk.len(), lags.player_walk_ms)
            {
                let frame = player.animation.frame();
                player.show_frame(&walk, frame);
            }
        }
    }
}

fn land_hit(enemy: &mut Agent, source: AttackSource, crit_distance: i32, report: &mut TickReport) {
    let Some(outcome) = enemy.take_shot(crit_distance) else {
        return;
    };
    report.shots.push(ShotReport {
        target: enemy.id(),
        source,
        outcome,
    });
    if outcome.killed {
        let death = enemy.sprites.death.clone();
        enemy.show_frame(&death, 0);
        info!(agent = enemy.id().get(), source = ?source, crit_distance, "enemy_killed");
    } else {
        debug!(
            agent = enemy.id().get(),
            source = ?source,
            crit_distance,
            health = enemy.vitals.health,
            armour = enemy.vitals.armour,
            "enemy_hit"
        );
    }
}
