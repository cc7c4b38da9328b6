use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the dashboard frontend
    let mut types = Vec::new();

    // Pipeline types
    types.push(clean_type(FlagVector::export_to_string()?));
    types.push(clean_type(LeadStatus::export_to_string()?));
    types.push(clean_type(DepositStatus::export_to_string()?));

    // Tab types
    types.push(clean_type(TabLabel::export_to_string()?));
    types.push(clean_type(LeadRoute::export_to_string()?));

    // Status modal types
    types.push(clean_type(AnsweredChoice::export_to_string()?));
    types.push(clean_type(InterestChoice::export_to_string()?));
    types.push(clean_type(LeadTypeChoice::export_to_string()?));
    types.push(clean_type(HotLeadChoice::export_to_string()?));
    types.push(clean_type(DepositChoice::export_to_string()?));
    types.push(clean_type(StatusSelection::export_to_string()?));

    // Lead types
    types.push(clean_type(Lead::export_to_string()?));
    types.push(clean_type(CreateLeadRequest::export_to_string()?));
    types.push(clean_type(UpdateLeadRequest::export_to_string()?));
    types.push(clean_type(UpdateLeadStatusRequest::export_to_string()?));
    types.push(clean_type(AssignLeadRequest::export_to_string()?));
    types.push(clean_type(LeadHistoryEntry::export_to_string()?));
    types.push(clean_type(LeadHistoryResponse::export_to_string()?));

    // Branch types
    types.push(clean_type(Branch::export_to_string()?));
    types.push(clean_type(CreateBranchRequest::export_to_string()?));
    types.push(clean_type(UpdateBranchRequest::export_to_string()?));

    // User types
    types.push(clean_type(UserRole::export_to_string()?));
    types.push(clean_type(User::export_to_string()?));
    types.push(clean_type(CreateUserRequest::export_to_string()?));
    types.push(clean_type(UpdateUserRequest::export_to_string()?));
    types.push(clean_type(LoginRequest::export_to_string()?));
    types.push(clean_type(LoginResponse::export_to_string()?));

    // Task types
    types.push(clean_type(Task::export_to_string()?));
    types.push(clean_type(TaskStatus::export_to_string()?));
    types.push(clean_type(TaskPriority::export_to_string()?));
    types.push(clean_type(CreateTaskRequest::export_to_string()?));
    types.push(clean_type(UpdateTaskRequest::export_to_string()?));

    // Envelope types
    types.push(clean_type(ApiResponse::<()>::export_to_string()?));
    types.push(clean_type(Paginated::<()>::export_to_string()?));
    types.push(clean_type(ListQuery::export_to_string()?));
    types.push(clean_type(DeleteRequest::export_to_string()?));

    let output_dir = Path::new("../dashboard/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
