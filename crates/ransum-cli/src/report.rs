use ransum_core::{
    Adequacy, HerdTotals, IntakeGuide, IntakeWarning, Nutrient, PricePoint, RationProblem, RationSolution,
    RationStatus, RequirementTable, SpeciesClass, Suggestion, SupplementPlan,
};

pub fn header(problem: &RationProblem) {
    println!(
        "Ration: {} / {}",
        problem.requirement.species_class, problem.requirement.life_stage
    );
    println!(
        "Intake: {:.2} - {:.2} kg per head per day",
        problem.min_total_kg, problem.max_total_kg
    );
    let enforced: Vec<_> = problem
        .active_nutrient_constraints
        .iter()
        .map(|n| n.to_string())
        .collect();
    println!("Enforced: {}", enforced.join(", "));
    println!();
}

pub fn solution(problem: &RationProblem, solution: &RationSolution, analysis: bool) {
    match solution.status {
        RationStatus::Optimal => {
            println!("Status: OPTIMAL");
            println!("Total: {:.3} kg", solution.total_kg);
            println!(
                "Total cost: {:.2} ({:.2} per kg)",
                solution.total_cost, solution.cost_per_kg
            );
            println!();

            println!("Ingredients:");
            for amount in solution.significant_amounts() {
                println!(
                    "  {:20} {:10.3} kg ({:5.2}%) {:12.2}",
                    amount.name,
                    amount.kg,
                    amount.kg / solution.total_kg * 100.0,
                    amount.cost
                );
            }
            println!();

            println!("Nutrients:");
            for check in &solution.checks {
                let unit = check.nutrient.unit().symbol();
                let mark = match check.adequacy {
                    Adequacy::Satisfied | Adequacy::WithinTolerance => "ok",
                    Adequacy::Deficient => "LOW",
                };
                println!(
                    "  {:8} {:10.3} {:4} min {:10.3} {:4} {}{}",
                    check.nutrient,
                    check.realized,
                    unit,
                    check.required,
                    unit,
                    mark,
                    if check.enforced { "" } else { " (not enforced)" }
                );
            }

            if !solution.category_shares.is_empty() {
                println!();
                println!("Categories:");
                for share in &solution.category_shares {
                    println!("  {:12} {:10.3} kg ({:5.2}%)", share.category, share.kg, share.fraction * 100.0);
                }
            }

            if analysis {
                println!();
                println!("Analysis:");
                println!();
                if !solution.binding.is_empty() {
                    println!("Binding constraints (pinch points):");
                    for binding in &solution.binding {
                        println!("  {:30} {:12.4}", binding.name, binding.shadow_price);
                    }
                }
            }
        }
        RationStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No ration meets every requirement with the selected ingredients.");
            if !solution.shortfalls.is_empty() {
                println!();
                println!("Shortfalls:");
                for shortfall in &solution.shortfalls {
                    match shortfall.nutrient {
                        Some(nutrient) => {
                            let unit = nutrient.unit().symbol();
                            println!(
                                "  {:8} needs {:.3} {}, best mix reaches {:.3} {}{}",
                                nutrient,
                                shortfall.required,
                                unit,
                                shortfall.achieved,
                                unit,
                                if shortfall.unattainable {
                                    " (no selected ingredient is rich enough)"
                                } else {
                                    ""
                                }
                            );
                        }
                        None => println!(
                            "  {:8} bound {:.3}, best mix reaches {:.3}",
                            shortfall.constraint, shortfall.required, shortfall.achieved
                        ),
                    }
                }
            }
            println!();
            println!(
                "Try adding ingredients to the {} selected, or widening the intake bounds.",
                problem.ingredients.len()
            );
        }
        RationStatus::NumericalFailure => {
            println!("Status: NUMERICAL FAILURE");
            println!("{}", solution.message);
        }
    }
}

pub fn intake(guide: &IntakeGuide, solution: &RationSolution, head_count: u32) {
    println!();
    println!("Intake guide ({:.0} kg body weight):", guide.body_weight_kg);
    println!(
        "  Dry matter: {:.2} kg per head, {:.2} kg for {} head",
        guide.dry_matter_kg(),
        guide.herd_dry_matter_kg(head_count),
        head_count
    );
    println!(
        "  Ideal forage:concentrate = {:.0}:{:.0}",
        guide.forage_share * 100.0,
        guide.concentrate_share() * 100.0
    );
    for warning in guide.review(solution) {
        match warning {
            IntakeWarning::LowIntake { total_kg, expected_kg } => println!(
                "  Warning: ration of {:.2} kg is below the expected {:.2} kg of dry matter",
                total_kg, expected_kg
            ),
            IntakeWarning::LowForage { share, ideal } => println!(
                "  Warning: forage is {:.0}% of the ration, ideal is {:.0}%",
                share * 100.0,
                ideal * 100.0
            ),
            IntakeWarning::LowConcentrate { share, ideal } => println!(
                "  Warning: concentrate is {:.0}% of the ration, ideal is {:.0}%",
                share * 100.0,
                ideal * 100.0
            ),
        }
    }
}

pub fn herd(totals: &HerdTotals) {
    println!();
    println!("Herd of {}:", totals.head_count);
    for amount in &totals.amounts {
        println!("  {:20} {:10.2} kg {:14.2}", amount.name, amount.kg, amount.cost);
    }
    println!("  Total per day: {:.2} kg, {:.2}", totals.total_kg, totals.total_cost);
    println!("  Total per month: {:.2}", totals.monthly_cost);
}

pub fn suggestions<'a>(suggestions: impl Iterator<Item = Suggestion<'a>>) {
    let suggestions: Vec<_> = suggestions.collect();
    println!();
    if suggestions.is_empty() {
        println!("No alternative ingredients to suggest.");
        return;
    }
    println!("Alternatives worth considering:");
    for suggestion in suggestions {
        println!("  - {}", suggestion);
    }
}

pub fn supplements(plans: &[SupplementPlan]) {
    println!();
    if plans.is_empty() {
        println!("No mineral supplement needed.");
        return;
    }
    println!("Mineral supplements (cheapest first):");
    for (i, plan) in plans.iter().enumerate() {
        println!("  Option {}: {} {:.3} kg ({:.2})", i + 1, plan.supplement, plan.kg, plan.cost);
        for fix in &plan.fixes {
            println!("    {:8} needs {:.3} kg", fix.nutrient, fix.kg);
        }
        if !plan.unresolved.is_empty() {
            println!("    does not cover: {}", join(&plan.unresolved));
        }
        if !plan.diluted.is_empty() {
            println!("    dilutes below minimum: {}", join(&plan.diluted));
        }
    }
}

pub fn stages(table: &RequirementTable, classes: &[SpeciesClass]) {
    let codes: Vec<String> = Nutrient::ALL
        .iter()
        .map(|n| format!("{:>8}", format!("{}({})", n, n.unit().symbol())))
        .collect();
    for class in classes {
        println!("{}:", class);
        println!("  {:22}{}", "stage", codes.join(""));
        for requirement in table.records().iter().filter(|r| r.species_class == *class) {
            let values: Vec<String> = requirement
                .minimums
                .iter()
                .map(|(_, v)| format!("{:>8.2}", v))
                .collect();
            println!("  {:22}{}", requirement.life_stage, values.join(""));
        }
        println!();
    }
}

pub fn sweep(ingredient: &str, points: &[PricePoint]) {
    println!("Price sweep for {}:", ingredient);
    println!("  {:>8} {:>12} {:>14} {:>10} {}", "factor", "price", "total cost", "kg used", "status");
    for point in points {
        let status = match point.solution.status {
            RationStatus::Optimal => "OPTIMAL",
            RationStatus::Infeasible => "INFEASIBLE",
            RationStatus::NumericalFailure => "NUMERICAL FAILURE",
        };
        println!(
            "  {:>8.2} {:>12.2} {:>14.2} {:>10.3} {}",
            point.factor,
            point.unit_cost,
            point.solution.total_cost,
            point.solution.amount(ingredient),
            status
        );
    }
}

fn join(nutrients: &[Nutrient]) -> String {
    nutrients.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
}
